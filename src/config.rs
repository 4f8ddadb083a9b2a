//! Client configuration.

use crate::GenerationOption;
use std::time::Duration;

pub(crate) const BASE_URL: &str = "https://www.emailnator.com";
pub(crate) const USER_AGENT_VALUE: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0";
pub(crate) const TIMEOUT: Duration = Duration::from_secs(15);

/// Settings used to build a [`Session`](crate::Session).
///
/// A session keeps its own copy and never mutates it. Override individual
/// fields with struct update syntax or go through [`ClientBuilder`](crate::ClientBuilder).
///
/// ```
/// use emailnator_client::Config;
/// use std::time::Duration;
///
/// let config = Config {
///     timeout: Duration::from_secs(5),
///     ..Default::default()
/// };
/// assert_eq!(config.base_url, "https://www.emailnator.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Service root, without a trailing slash.
    pub base_url: String,
    /// Upper bound for every request.
    pub timeout: Duration,
    /// Proxy URL for all requests. When unset, environment proxies are ignored too.
    pub proxy: Option<String>,
    /// Allow HTTP/2 negotiation. When false the transport speaks HTTP/1.1 only.
    pub http2: bool,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Options used by [`Client::generate_email`](crate::Client::generate_email)
    /// and bulk generation.
    pub options: Vec<GenerationOption>,
    /// Skip TLS certificate validation.
    pub danger_accept_invalid_certs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: TIMEOUT,
            proxy: None,
            http2: true,
            user_agent: USER_AGENT_VALUE.to_string(),
            options: vec![GenerationOption::DotGmail, GenerationOption::PlusGmail],
            danger_accept_invalid_certs: false,
        }
    }
}

impl Config {
    /// Build an endpoint URL from a path such as `/generate-email`.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Value for the `Referer` header: the service root with a trailing slash.
    pub(crate) fn referer(&self) -> String {
        self.url("/")
    }
}
