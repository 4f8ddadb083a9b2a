//! XSRF token lifecycle.
//!
//! Emailnator hands out its anti-forgery token as an `XSRF-TOKEN` cookie on
//! the landing page and expects it back in an `X-XSRF-TOKEN` header on every
//! POST. [`TokenStore`] fetches that token lazily, keeps the derived header set
//! next to it, and refreshes both on request.

use crate::config::Config;
use crate::{Error, Result};
use parking_lot::RwLock;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{
    CONTENT_TYPE, DNT, HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Cookie the service uses to hand out the token.
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
const XSRF_COOKIE_PREFIX: &str = "XSRF-TOKEN=";
const XSRF_COOKIE_SEPARATOR: char = ';';
/// Header the token is echoed back in.
pub const X_XSRF_TOKEN: HeaderName = HeaderName::from_static("x-xsrf-token");
const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// The token and the headers derived from it. Always replaced or updated as
/// one value so the two never disagree.
#[derive(Debug, Clone)]
struct TokenState {
    token: String,
    headers: HeaderMap,
}

/// Holds the current XSRF token and request headers.
///
/// Initialization is double-checked: callers that find the token missing
/// queue on a single async section, and only the first one through performs
/// the fetch. [`TokenStore::refresh`] takes the same section, so at most one
/// fetch is in flight at a time.
///
/// Closing is final: a closed store never holds a token again.
#[derive(Debug)]
pub struct TokenStore {
    bootstrap_url: String,
    referer: String,
    user_agent: String,
    jar: Option<Arc<Jar>>,
    state: RwLock<Option<TokenState>>,
    closed: AtomicBool,
    section: Mutex<()>,
}

impl TokenStore {
    /// Create an empty store. Nothing is fetched until first use.
    pub fn new(config: &Config) -> Self {
        Self {
            bootstrap_url: config.url("/"),
            referer: config.referer(),
            user_agent: config.user_agent.clone(),
            jar: None,
            state: RwLock::new(None),
            closed: AtomicBool::new(false),
            section: Mutex::new(()),
        }
    }

    /// Also look for the cookie in `jar` when the bootstrap response itself
    /// does not carry it (e.g. it was set on a redirect hop).
    ///
    /// `jar` should be the cookie provider of the client passed to
    /// [`ensure`](Self::ensure) and [`refresh`](Self::refresh).
    pub fn with_jar(mut self, jar: Arc<Jar>) -> Self {
        self.jar = Some(jar);
        self
    }

    /// Make sure a token is present, fetching it if needed.
    ///
    /// Fails with [`Error::TokenUnavailable`] when the landing page does not
    /// set the cookie, and with [`Error::SessionClosed`] once the store is closed.
    pub async fn ensure(&self, http: &reqwest::Client) -> Result<()> {
        if self.state.read().is_some() {
            return Ok(());
        }

        let _section = self.section.lock().await;
        if self.state.read().is_some() {
            return Ok(());
        }
        self.check_open()?;

        let token = self
            .fetch_raw(http)
            .await?
            .as_deref()
            .and_then(decode_token)
            .ok_or(Error::TokenUnavailable)?;
        let headers = self.derive_headers(&token)?;

        let mut state = self.state.write();
        self.check_open()?;
        *state = Some(TokenState { token, headers });
        debug!("XSRF token initialized");
        Ok(())
    }

    /// Return the current token, fetching it first if needed.
    pub async fn get_token(&self, http: &reqwest::Client) -> Result<String> {
        self.ensure(http).await?;
        self.state
            .read()
            .as_ref()
            .map(|state| state.token.clone())
            .ok_or(Error::TokenUnavailable)
    }

    /// Return a copy of the request headers, fetching the token first if needed.
    ///
    /// The map is owned by the caller; changing it does not affect the store.
    pub async fn get_headers(&self, http: &reqwest::Client) -> Result<HeaderMap> {
        self.ensure(http).await?;
        self.state
            .read()
            .as_ref()
            .map(|state| state.headers.clone())
            .ok_or(Error::TokenUnavailable)
    }

    /// Fetch a new token even if one is already held.
    ///
    /// Only the token header is replaced; the other headers stay as they are.
    pub async fn refresh(&self, http: &reqwest::Client) -> Result<()> {
        let _section = self.section.lock().await;
        self.check_open()?;

        let raw = self.fetch_raw(http).await?.ok_or_else(|| {
            warn!("XSRF token refresh got no cookie");
            Error::refresh_failed("no raw token received")
        })?;
        let token = decode_token(&raw).ok_or_else(|| {
            warn!("XSRF token refresh decoded to nothing");
            Error::refresh_failed("decoding returned empty token")
        })?;
        let value = HeaderValue::from_str(&token)?;

        let mut state = self.state.write();
        self.check_open()?;
        match state.as_mut() {
            Some(current) => {
                current.headers.insert(X_XSRF_TOKEN, value);
                current.token = token;
            }
            None => {
                let headers = self.derive_headers(&token)?;
                *state = Some(TokenState { token, headers });
            }
        }
        debug!("XSRF token refreshed");
        Ok(())
    }

    /// Drop the token and headers for good. Later calls fail with
    /// [`Error::SessionClosed`].
    ///
    /// Waits for an in-flight fetch to finish first.
    pub async fn close(&self) {
        let _section = self.section.lock().await;
        self.close_now();
    }

    /// [`close`](Self::close) without waiting for the section. A fetch still
    /// in flight finds the store closed and discards its token.
    pub fn close_now(&self) {
        let mut state = self.state.write();
        self.closed.store(true, Ordering::Release);
        *state = None;
    }

    /// Whether a token is currently held.
    pub fn is_ready(&self) -> bool {
        self.state.read().is_some()
    }

    /// Whether [`close`](Self::close) or [`close_now`](Self::close_now) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    async fn fetch_raw(&self, http: &reqwest::Client) -> Result<Option<String>> {
        debug!(url = %self.bootstrap_url, "fetching XSRF token");
        let response = http
            .get(&self.bootstrap_url)
            .send()
            .await?
            .error_for_status()?;

        let raw = response
            .cookies()
            .find(|cookie| cookie.name() == XSRF_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .or_else(|| self.jar_token(response.url()));

        Ok(raw.filter(|raw| !raw.is_empty()))
    }

    /// Read the token out of the cookie jar, as sent for `url`.
    fn jar_token(&self, url: &reqwest::Url) -> Option<String> {
        let cookies = self.jar.as_ref()?.cookies(url)?;
        cookies
            .to_str()
            .ok()?
            .split(XSRF_COOKIE_SEPARATOR)
            .find_map(|pair| pair.trim().strip_prefix(XSRF_COOKIE_PREFIX))
            .map(str::to_string)
    }

    fn derive_headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(X_XSRF_TOKEN, HeaderValue::from_str(token)?);
        headers.insert(DNT, HeaderValue::from_static("1"));
        headers.insert(REFERER, HeaderValue::from_str(&self.referer)?);
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        Ok(headers)
    }
}

/// Percent-decode a raw cookie value. `None` if it is empty or not UTF-8.
fn decode_token(raw: &str) -> Option<String> {
    urlencoding::decode(raw)
        .ok()
        .map(|token| token.into_owned())
        .filter(|token| !token.is_empty())
}
