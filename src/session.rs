//! The shared HTTP session.
//!
//! A [`Session`] owns one `reqwest::Client` (connection pool, TLS sessions,
//! cookie jar) plus the [`TokenStore`] that guards it. Most programs use the
//! process-wide handle returned by [`Session::shared`]; it is created on the
//! first call and torn down with [`Session::shutdown`].
//!
//! Once [`Session::close`] has run, that instance rejects every call with
//! [`Error::SessionClosed`]. The process-wide accessor treats a closed handle
//! as absent and registers a fresh session on its next call.

use crate::config::Config;
use crate::token::TokenStore;
use crate::{Error, Result};
use parking_lot::RwLock;
use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

static SHARED: RwLock<Option<Arc<Session>>> = RwLock::new(None);
static SHARED_INIT: Mutex<()> = Mutex::const_new(());

/// Shared transport plus XSRF token state.
#[derive(Debug)]
pub struct Session {
    config: Config,
    http: RwLock<Option<reqwest::Client>>,
    tokens: TokenStore,
    lifecycle: Mutex<()>,
}

impl Session {
    /// Build the transport without contacting the service.
    ///
    /// The token is fetched on first use, or up front with
    /// [`Session::initialize`].
    pub fn new(config: Config) -> Result<Self> {
        // Keeps the service's session cookie alongside the XSRF token.
        let jar = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .cookie_provider(Arc::clone(&jar));

        builder = match &config.proxy {
            Some(proxy_url) => builder.proxy(reqwest::Proxy::all(proxy_url)?),
            None => builder.no_proxy(),
        };

        if !config.http2 {
            builder = builder.http1_only();
        }

        let http = builder.build()?;
        let tokens = TokenStore::new(&config).with_jar(jar);
        debug!(base_url = %config.base_url, http2 = config.http2, "session transport built");

        Ok(Self {
            config,
            http: RwLock::new(Some(http)),
            tokens,
            lifecycle: Mutex::new(()),
        })
    }

    /// Build the transport and fetch the XSRF token before returning.
    pub async fn initialize(config: Config) -> Result<Self> {
        let session = Self::new(config)?;
        session.tokens.ensure(&session.client()?).await?;
        Ok(session)
    }

    /// The process-wide session, created with default settings on first use.
    pub async fn shared() -> Result<Arc<Session>> {
        Self::shared_with(Config::default()).await
    }

    /// The process-wide session, created from `config` on first use.
    ///
    /// `config` only matters when a new session is registered; while a live
    /// session exists it is returned as is.
    pub async fn shared_with(config: Config) -> Result<Arc<Session>> {
        if let Some(session) = Self::live_shared() {
            return Ok(session);
        }

        let _init = SHARED_INIT.lock().await;
        if let Some(session) = Self::live_shared() {
            return Ok(session);
        }

        let session = Arc::new(Self::initialize(config).await?);
        *SHARED.write() = Some(Arc::clone(&session));
        info!(base_url = %session.config.base_url, "shared session registered");
        Ok(session)
    }

    /// Close and unregister the process-wide session, if any.
    ///
    /// Holders of the old handle see [`Error::SessionClosed`] from then on.
    pub async fn shutdown() {
        let _init = SHARED_INIT.lock().await;
        let session = SHARED.write().take();
        if let Some(session) = session {
            session.close().await;
            info!("shared session shut down");
        }
    }

    fn live_shared() -> Option<Arc<Session>> {
        SHARED
            .read()
            .as_ref()
            .filter(|session| !session.is_closed())
            .cloned()
    }

    /// The settings this session was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying HTTP client. Cloning it is cheap and shares the pool.
    pub fn client(&self) -> Result<reqwest::Client> {
        self.http.read().clone().ok_or(Error::SessionClosed)
    }

    /// Request headers carrying the current XSRF token.
    pub async fn get_headers(&self) -> Result<HeaderMap> {
        let http = self.client()?;
        self.tokens.get_headers(&http).await
    }

    /// The current XSRF token.
    pub async fn get_token(&self) -> Result<String> {
        let http = self.client()?;
        self.tokens.get_token(&http).await
    }

    /// Force a new XSRF token fetch.
    pub async fn refresh_token(&self) -> Result<()> {
        let http = self.client()?;
        self.tokens.refresh(&http).await
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.http.read().is_none()
    }

    /// Release the transport and forget the token. Safe to call repeatedly.
    ///
    /// Dropping the last client handle closes pooled connections; clones
    /// already handed out keep working until they are dropped.
    pub async fn close(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        self.release();
        self.tokens.close().await;
    }

    /// The part of [`close`](Self::close) that needs no `.await`.
    fn close_now(&self) {
        self.release();
        self.tokens.close_now();
    }

    fn release(&self) {
        let released = self.http.write().take();
        if released.is_some() {
            info!(base_url = %self.config.base_url, "session closed");
        }
    }

    /// Run `f` with this session and close the session afterwards, whether
    /// `f` succeeded, failed, panicked, or the returned future was dropped
    /// before completion.
    ///
    /// ```no_run
    /// # use emailnator_client::{Client, Session};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), emailnator_client::Error> {
    /// let session = Session::shared().await?;
    /// let email = session
    ///     .scope(|session| async move {
    ///         Client::with_session(session).generate_email().await
    ///     })
    ///     .await?;
    /// println!("{email}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scope<F, Fut, T>(self: Arc<Self>, f: F) -> Result<T>
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _guard = CloseOnDrop(&self);
        let outcome = f(Arc::clone(&self)).await;
        if let Err(err) = &outcome {
            debug!(error = %err, "session scope exited with error");
        }
        self.close().await;
        outcome
    }
}

/// Closes the session if a [`Session::scope`] future is dropped early.
struct CloseOnDrop<'a>(&'a Session);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        if !self.0.is_closed() {
            debug!("session scope abandoned, closing");
            self.0.close_now();
        }
    }
}
