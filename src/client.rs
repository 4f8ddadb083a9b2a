//! Emailnator async client implementation.

use crate::config::Config;
use crate::decode;
use crate::session::Session;
use crate::{BulkCount, Error, GenerationOption, Message, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[a-zA-Z0-9]+$").expect("email pattern is valid")
});

const GENERATE_EMAIL: &str = "/generate-email";
const MESSAGE_LIST: &str = "/message-list";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    email: &'a [GenerationOption],
    #[serde(rename = "emailNo", skip_serializing_if = "Option::is_none")]
    email_no: Option<BulkCount>,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    email: &'a str,
    #[serde(rename = "messageID", skip_serializing_if = "Option::is_none")]
    message_id: Option<&'a str>,
}

/// Async client for the Emailnator temporary email service.
///
/// Use [`Client::new`] for the process-wide session with default settings,
/// [`Client::builder`] for custom settings, or [`Client::with_session`] to
/// bring your own [`Session`].
#[derive(Debug, Clone)]
pub struct Client {
    session: Arc<Session>,
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client on the process-wide session.
    ///
    /// The first call connects to Emailnator and fetches the XSRF token.
    ///
    /// # Examples
    /// ```no_run
    /// # use emailnator_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), emailnator_client::Error> {
    /// let client = Client::new().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new() -> Result<Self> {
        ClientBuilder::new().build().await
    }

    /// Create a client on an existing session.
    pub fn with_session(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// The session this client sends requests through.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Generate one address using the configured default options.
    ///
    /// # Examples
    /// ```no_run
    /// # use emailnator_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), emailnator_client::Error> {
    /// let client = Client::new().await?;
    /// let email = client.generate_email().await?;
    /// println!("{email}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate_email(&self) -> Result<String> {
        let options = self.session.config().options.clone();
        let email = self
            .generate_emails(&options)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("Email generator returned no address.".into()))?;

        if email.trim().is_empty() {
            return Err(Error::InvalidResponse(
                "Email generator returned invalid or empty data.".into(),
            ));
        }
        if !has_domain(&email) {
            return Err(Error::InvalidResponse(format!(
                "Invalid email format returned: {email:?}"
            )));
        }
        Ok(email)
    }

    /// Generate addresses for an explicit set of options.
    ///
    /// The service may return more than one address.
    pub async fn generate_emails(&self, options: &[GenerationOption]) -> Result<Vec<String>> {
        let emails = self
            .request_addresses(GenerateRequest {
                email: options,
                email_no: None,
            })
            .await?;

        if emails.is_empty() {
            return Err(Error::InvalidResponse(
                "Email generator returned an empty list.".into(),
            ));
        }
        Ok(emails)
    }

    /// Generate a batch of 100, 200 or 300 addresses with the default options.
    ///
    /// # Examples
    /// ```no_run
    /// # use emailnator_client::{BulkCount, Client};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), emailnator_client::Error> {
    /// let client = Client::new().await?;
    /// let emails = client.generate_bulk_emails(BulkCount::TwoHundred).await?;
    /// println!("{}", emails.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate_bulk_emails(&self, count: BulkCount) -> Result<Vec<String>> {
        let options = &self.session.config().options;
        let emails = self
            .request_addresses(GenerateRequest {
                email: options,
                email_no: Some(count),
            })
            .await?;

        if emails.is_empty() {
            return Err(Error::InvalidResponse(
                "Email generator returned an empty list.".into(),
            ));
        }
        if emails.iter().any(|email| email.trim().is_empty()) {
            return Err(Error::InvalidResponse(
                "Email generator returned a list with invalid email strings.".into(),
            ));
        }
        Ok(emails)
    }

    /// List the inbox of an address.
    ///
    /// # Examples
    /// ```no_run
    /// # use emailnator_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), emailnator_client::Error> {
    /// let client = Client::new().await?;
    /// let email = client.generate_email().await?;
    /// for msg in client.get_messages(&email).await? {
    ///     println!("{}: {}", msg.from, msg.subject);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_messages(&self, email: &str) -> Result<Vec<Message>> {
        validate_email(email)?;

        let response = self
            .post(MESSAGE_LIST, &MessageRequest {
                email,
                message_id: None,
            })
            .await?;
        let (status, body) = decode::read(response).await?;
        decode::decode_messages(status, &body, "message-list")
    }

    /// Fetch the raw body (usually HTML) of one message.
    pub async fn get_message(&self, email: &str, message_id: &str) -> Result<String> {
        validate_email(email)?;
        if message_id.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Message ID must be a non-empty string.".into(),
            ));
        }

        let response = self
            .post(MESSAGE_LIST, &MessageRequest {
                email,
                message_id: Some(message_id),
            })
            .await?;
        let (status, body) = decode::read(response).await?;
        let content = decode::decode_body(status, body, "message")?;

        if content.trim().is_empty() {
            return Err(Error::InvalidResponse(
                "Message getter returned an empty message.".into(),
            ));
        }
        Ok(content)
    }

    /// Find the id of the first message whose sender is `sender`.
    ///
    /// Returns `None` when no message matches. An empty listing or an empty
    /// sender is rejected.
    pub fn parse_message_from_sender(messages: &[Message], sender: &str) -> Result<Option<String>> {
        if messages.is_empty() {
            return Err(Error::InvalidInput(
                "Messages must be a non-empty list.".into(),
            ));
        }
        if sender.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Sender must be a non-empty string.".into(),
            ));
        }

        Ok(messages
            .iter()
            .find(|msg| msg.from == sender)
            .map(|msg| msg.message_id.clone()))
    }

    /// Fetch the body of the first message from `sender`, if there is one.
    ///
    /// # Examples
    /// ```no_run
    /// # use emailnator_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), emailnator_client::Error> {
    /// let client = Client::new().await?;
    /// let email = client.generate_email().await?;
    /// if let Some(body) = client.get_message_from_sender("AI TOOLS", &email).await? {
    ///     println!("{body}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_message_from_sender(&self, sender: &str, email: &str) -> Result<Option<String>> {
        if sender.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Sender must be a non-empty string.".into(),
            ));
        }
        let messages = self.get_messages(email).await?;
        if messages.is_empty() {
            return Ok(None);
        }

        match Self::parse_message_from_sender(&messages, sender)? {
            Some(id) => self.get_message(email, &id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn request_addresses(&self, request: GenerateRequest<'_>) -> Result<Vec<String>> {
        let response = self.post(GENERATE_EMAIL, &request).await?;
        let (status, body) = decode::read(response).await?;
        decode::decode_addresses(status, &body, "generate-email")
    }

    /// POST a JSON body with the session's XSRF headers.
    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let http = self.session.client()?;
        let headers = self.session.get_headers().await?;

        http.post(self.session.config().url(path))
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(Into::into)
    }
}

/// Reject empty or obviously malformed addresses before they reach the service.
fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::InvalidInput("Email must be a non-empty string.".into()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(Error::InvalidInput(format!("Invalid email format: {email}")));
    }
    Ok(())
}

fn has_domain(email: &str) -> bool {
    email
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.'))
}

/// Builder for configuring an Emailnator client.
///
/// Start with [`Client::builder`] to override defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: Config,
    dedicated: bool,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - No proxy (environment proxies are ignored)
    /// - HTTP/2 allowed
    /// - 15 second timeout
    /// - `dotGmail` and `plusGmail` generation options
    /// - TLS certificates validated
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a proxy URL (e.g., "http://127.0.0.1:8080" or "socks5://127.0.0.1:1080").
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy.into());
        self
    }

    /// Control whether to accept invalid TLS certificates (default: false).
    pub fn danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.config.danger_accept_invalid_certs = value;
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Override the service root.
    ///
    /// Useful for testing against a local server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Allow or forbid HTTP/2 (default: allowed).
    pub fn http2(mut self, enabled: bool) -> Self {
        self.config.http2 = enabled;
        self
    }

    /// Replace the default generation options.
    pub fn options(mut self, options: impl IntoIterator<Item = GenerationOption>) -> Self {
        self.config.options = options.into_iter().collect();
        self
    }

    /// Build on a private session instead of the process-wide one.
    pub fn dedicated(mut self, dedicated: bool) -> Self {
        self.dedicated = dedicated;
        self
    }

    /// Build the client and fetch the XSRF token.
    ///
    /// Unless [`dedicated`](Self::dedicated) is set, this goes through
    /// [`Session::shared_with`]: the first registration wins and later
    /// builders reuse the live session whatever their settings.
    ///
    /// # Examples
    /// ```no_run
    /// # use emailnator_client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), emailnator_client::Error> {
    /// let client = Client::builder()
    ///     .user_agent("my-app/1.0")
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(self) -> Result<Client> {
        let session = if self.dedicated {
            Arc::new(Session::initialize(self.config).await?)
        } else {
            Session::shared_with(self.config).await?
        };
        Ok(Client { session })
    }
}
