//! Error types for the Emailnator client.

use thiserror::Error;

/// Errors returned by the Emailnator client.
///
/// Every failure mode has its own variant so callers can match on it
/// instead of inspecting message text.
#[derive(Debug, Error)]
pub enum Error {
    /// The bootstrap response did not set an `XSRF-TOKEN` cookie.
    #[error("XSRF-TOKEN not found in cookies")]
    TokenUnavailable,

    /// A forced token refresh did not produce a usable token.
    #[error("failed to refresh XSRF-TOKEN: {reason}")]
    TokenRefreshFailed {
        /// What went wrong during the refresh.
        reason: String,
    },

    /// The service answered with an error status or an unexpected payload.
    #[error("{context} {message}")]
    Upstream {
        /// The endpoint or operation that failed, e.g. `generate-email`.
        context: String,
        /// Status and (truncated) response body.
        message: String,
    },

    /// Network-level failure: connection, timeout, TLS or proxy setup.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A token or user agent could not be encoded as a header value.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// A caller-supplied argument was rejected before any request was sent.
    #[error("{0}")]
    InvalidInput(String),

    /// A decoded payload was well-formed but unusable (e.g. empty).
    #[error("{0}")]
    InvalidResponse(String),

    /// The session was closed and can no longer be used.
    #[error("session is closed")]
    SessionClosed,
}

impl Error {
    pub(crate) fn upstream(context: &str, message: impl Into<String>) -> Self {
        Error::Upstream {
            context: context.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn refresh_failed(reason: impl Into<String>) -> Self {
        Error::TokenRefreshFailed {
            reason: reason.into(),
        }
    }
}
