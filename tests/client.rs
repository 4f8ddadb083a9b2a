use emailnator_client::{BulkCount, Client, Error, GenerationOption};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

async fn bootstrap<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
    let cookie = format!("XSRF-TOKEN={token}; path=/");
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/");
            then.status(200).header("set-cookie", cookie.as_str()).body("<html></html>");
        })
        .await
}

async fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(server.base_url())
        .user_agent("emailnator-client-tests")
        .dedicated(true)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn generate_email_sends_token_headers() {
    let server = MockServer::start_async().await;
    let token = bootstrap(&server, "abc%20123").await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/generate-email")
                .header("x-xsrf-token", "abc 123")
                .header("x-requested-with", "XMLHttpRequest")
                .header("content-type", "application/json")
                .header("dnt", "1")
                .header("user-agent", "emailnator-client-tests")
                .json_body(json!({"email": ["dotGmail", "plusGmail"]}));
            then.status(200).json_body(json!({"email": "john.doe@gmail.com"}));
        })
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.session().get_token().await.unwrap(), "abc 123");

    let email = client.generate_email().await.unwrap();
    assert_eq!(email, "john.doe@gmail.com");

    generate.assert_async().await;
    token.assert_hits_async(1).await;
}

#[tokio::test]
async fn generate_emails_uses_given_options() {
    let server = MockServer::start_async().await;
    bootstrap(&server, "tok").await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/generate-email")
                .json_body(json!({"email": ["domain", "googleMail"]}));
            then.status(200)
                .json_body(json!({"email": ["a@mail.com", "b@googlemail.com"]}));
        })
        .await;

    let client = client_for(&server).await;
    let emails = client
        .generate_emails(&[GenerationOption::Domain, GenerationOption::GoogleMail])
        .await
        .unwrap();
    assert_eq!(emails, vec!["a@mail.com", "b@googlemail.com"]);
}

#[tokio::test]
async fn bulk_generation_sends_count() {
    let server = MockServer::start_async().await;
    bootstrap(&server, "tok").await;
    let bulk = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/generate-email")
                .json_body(json!({"email": ["dotGmail", "plusGmail"], "emailNo": "200"}));
            then.status(200)
                .json_body(json!({"email": ["u1@gmail.com", "u2@gmail.com"]}));
        })
        .await;

    let client = client_for(&server).await;
    let emails = client.generate_bulk_emails(BulkCount::TwoHundred).await.unwrap();
    assert_eq!(emails.len(), 2);
    bulk.assert_async().await;
}

#[tokio::test]
async fn empty_generation_is_not_success() {
    let server = MockServer::start_async().await;
    bootstrap(&server, "tok").await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/generate-email");
            then.status(200).json_body(json!({"email": []}));
        })
        .await;

    let client = client_for(&server).await;
    let err = client.generate_bulk_emails(BulkCount::Hundred).await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));
    assert!(err.to_string().contains("empty list"));
}

#[tokio::test]
async fn generation_error_status_is_upstream_error() {
    let server = MockServer::start_async().await;
    bootstrap(&server, "tok").await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/generate-email");
            then.status(419).body("Page Expired");
        })
        .await;

    let client = client_for(&server).await;
    match client.generate_email().await.unwrap_err() {
        Error::Upstream { context, message } => {
            assert_eq!(context, "generate-email");
            assert!(message.contains("419"));
            assert!(message.contains("Page Expired"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn refreshed_token_is_used_by_later_requests() {
    let server = MockServer::start_async().await;
    let old = bootstrap(&server, "old").await;
    let client = client_for(&server).await;
    old.delete_async().await;

    bootstrap(&server, "new").await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/generate-email")
                .header("x-xsrf-token", "new");
            then.status(200).json_body(json!({"email": "fresh@gmail.com"}));
        })
        .await;

    client.session().refresh_token().await.unwrap();
    assert_eq!(client.generate_email().await.unwrap(), "fresh@gmail.com");
    generate.assert_async().await;
}

#[tokio::test]
async fn messages_and_sender_lookup() {
    let server = MockServer::start_async().await;
    bootstrap(&server, "tok").await;
    let listing = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/message-list")
                .json_body(json!({"email": "john.doe@gmail.com"}));
            then.status(200).json_body(json!({"messageData": [
                {"messageID": "ADSVPN", "from": "AI TOOLS", "subject": "Ad", "time": "Just Now"},
                {"messageID": "MTk0", "from": "Bob", "subject": "Code", "time": "Just Now"}
            ]}));
        })
        .await;
    let body = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/message-list")
                .json_body(json!({"email": "john.doe@gmail.com", "messageID": "MTk0"}));
            then.status(200).body("<div>Your code is 123456</div>");
        })
        .await;

    let client = client_for(&server).await;

    let messages = client.get_messages("john.doe@gmail.com").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].from, "AI TOOLS");

    let content = client
        .get_message_from_sender("Bob", "john.doe@gmail.com")
        .await
        .unwrap();
    assert_eq!(content.as_deref(), Some("<div>Your code is 123456</div>"));

    let missing = client
        .get_message_from_sender("Carol", "john.doe@gmail.com")
        .await
        .unwrap();
    assert_eq!(missing, None);

    listing.assert_hits_async(3).await;
    body.assert_hits_async(1).await;
}

#[tokio::test]
async fn malformed_listing_is_upstream_error() {
    let server = MockServer::start_async().await;
    bootstrap(&server, "tok").await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/message-list");
            then.status(200).json_body(json!({"messageData": "not-a-list"}));
        })
        .await;

    let client = client_for(&server).await;
    let err = client.get_messages("john.doe@gmail.com").await.unwrap_err();
    assert!(matches!(err, Error::Upstream { .. }));
}

#[tokio::test]
async fn empty_message_body_is_rejected() {
    let server = MockServer::start_async().await;
    bootstrap(&server, "tok").await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/message-list");
            then.status(200).body("   ");
        })
        .await;

    let client = client_for(&server).await;
    let err = client.get_message("john.doe@gmail.com", "MTk0").await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_service() {
    let server = MockServer::start_async().await;
    bootstrap(&server, "tok").await;
    let any_post = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"messageData": []}));
        })
        .await;

    let client = client_for(&server).await;

    for email in ["", "not-an-email", "user@nodot"] {
        let err = client.get_messages(email).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "{email}");
    }
    assert!(matches!(
        client.get_message("john.doe@gmail.com", " ").await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        client.get_message_from_sender("", "john.doe@gmail.com").await,
        Err(Error::InvalidInput(_))
    ));

    any_post.assert_hits_async(0).await;
}

#[tokio::test]
async fn closed_session_rejects_requests() {
    let server = MockServer::start_async().await;
    bootstrap(&server, "tok").await;

    let client = client_for(&server).await;
    client.session().close().await;

    assert!(matches!(
        client.generate_email().await,
        Err(Error::SessionClosed)
    ));
}

#[tokio::test]
async fn missing_cookie_fails_build() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("<html></html>");
        })
        .await;

    let err = Client::builder()
        .base_url(server.base_url())
        .dedicated(true)
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TokenUnavailable));
}

#[tokio::test]
async fn slow_service_hits_the_configured_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .header("set-cookie", "XSRF-TOKEN=late; path=/")
                .delay(Duration::from_millis(800));
        })
        .await;

    let err = Client::builder()
        .base_url(server.base_url())
        .timeout(Duration::from_millis(100))
        .dedicated(true)
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Request(ref e) if e.is_timeout()), "{err:?}");
}
