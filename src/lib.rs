//! # Emailnator Client
//! Asynchronous wrapper around the Emailnator disposable email service: generate Gmail-style or domain addresses, list their inboxes, and read messages using [`Client`] and [`ClientBuilder`].
//!
//! ## Sessions and tokens
//! Emailnator guards its API with an XSRF token handed out as a cookie. A [`Session`] owns one shared HTTP transport and a [`TokenStore`] that fetches the token lazily, attaches it to every request, and refreshes it on demand. Concurrent first callers trigger exactly one token fetch. Most programs share the process-wide session returned by [`Session::shared`] and release it with [`Session::shutdown`].
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`. Diagnostics are emitted through `tracing`; install a subscriber to see them.
//!
//! ## Out of scope
//! Not a general-purpose HTTP or mail client. There are no retries: a stale token shows up as a failed call, and the caller decides whether to [`Session::refresh_token`] and try again.
//!
//! ## Errors
//! Transport failures surface as [`Error::Request`]; error statuses and malformed payloads become [`Error::Upstream`] with the endpoint name and a truncated body. Token problems are [`Error::TokenUnavailable`] or [`Error::TokenRefreshFailed`]. The crate-wide [`Result`] alias wraps these errors.
//!
//! ## Example
//! ```no_run
//! use emailnator_client::{Client, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), emailnator_client::Error> {
//!     let client = Client::new().await?;
//!     let email = client.generate_email().await?;
//!     println!("Created: {}", email);
//!
//!     let messages = client.get_messages(&email).await?;
//!     for msg in &messages {
//!         println!("From: {}, Subject: {}", msg.from, msg.subject);
//!     }
//!
//!     Session::shutdown().await;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
pub mod decode;
mod error;
mod models;
mod session;
pub mod token;

pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use error::Error;
pub use models::{BulkCount, GenerationOption, Message};
pub use session::Session;
pub use token::TokenStore;

/// Result type alias for Emailnator operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
