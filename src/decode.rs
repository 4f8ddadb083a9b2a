//! Response validation for the generation and listing endpoints.
//!
//! Each decoder is a pure function of status, body and a context label. The
//! label only appears in error messages.

use crate::{Error, Message, Result};
use reqwest::StatusCode;
use serde_json::Value;

/// Longest body excerpt carried in an error message, in characters.
const BODY_EXCERPT: usize = 400;

/// Extract the generated addresses from a `generate-email` response.
///
/// `email` may be a single string or a list of strings.
pub fn decode_addresses(status: StatusCode, body: &str, context: &str) -> Result<Vec<String>> {
    let data = parse_json(status, body, context)?;

    match data.get("email") {
        Some(Value::String(email)) => Ok(vec![email.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| invalid_field(context, "email", body)),
        _ => Err(invalid_field(context, "email", body)),
    }
}

/// Extract the inbox listing from a `message-list` response.
pub fn decode_messages(status: StatusCode, body: &str, context: &str) -> Result<Vec<Message>> {
    let data = parse_json(status, body, context)?;

    let Some(Value::Array(records)) = data.get("messageData") else {
        return Err(invalid_field(context, "messageData", body));
    };

    records
        .iter()
        .map(|record| match record {
            Value::Object(_) => serde_json::from_value::<Message>(record.clone()).ok(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid_field(context, "messageData", body))
}

/// Return a message body as-is, after checking the status.
pub fn decode_body(status: StatusCode, body: String, context: &str) -> Result<String> {
    check_status(status, &body, context)?;
    Ok(body)
}

/// Read status and body off a response so the decoders above can run on them.
pub(crate) async fn read(response: reqwest::Response) -> Result<(StatusCode, String)> {
    let status = response.status();
    let body = response.text().await?;
    Ok((status, body))
}

fn check_status(status: StatusCode, body: &str, context: &str) -> Result<()> {
    if status.as_u16() >= 400 {
        return Err(Error::upstream(
            context,
            format!("returned {}: {}", status.as_u16(), excerpt(body)),
        ));
    }
    Ok(())
}

fn parse_json(status: StatusCode, body: &str, context: &str) -> Result<Value> {
    check_status(status, body, context)?;
    serde_json::from_str(body).map_err(|_| {
        Error::upstream(
            context,
            format!("response is not valid JSON: {}", excerpt(body)),
        )
    })
}

fn invalid_field(context: &str, field: &str, body: &str) -> Error {
    Error::upstream(
        context,
        format!(
            "response does not contain valid '{field}' data: {}",
            excerpt(body)
        ),
    )
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
