//! HTTP client and configuration.

mod auth;
mod http;

pub use auth::Session;
pub use http::{HttpConfig, DEFAULT_BASE_URL, DEFAULT_FILES_URL};

use crate::api::{ChannelApi, FileApi, UserApi};
use crate::error::{Error, Result};
use http::{build_client, HttpExecutor};
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating ChatClient.
pub struct ChatClientBuilder {
    session: Option<Session>,
    http_config: HttpConfig,
}

impl std::fmt::Debug for ChatClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClientBuilder")
            .field("session", &self.session)
            .field("http_config", &self.http_config)
            .finish()
    }
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            session: None,
            http_config: HttpConfig::default(),
        }
    }

    /// Set the session token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.session = Some(Session::new(token));
        self
    }

    /// Set the session.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Set API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.http_config.base_url = url.into();
        self
    }

    /// Set file server base URL.
    pub fn files_url(mut self, url: impl Into<String>) -> Self {
        self.http_config.files_url = url.into();
        self
    }

    /// Set custom user agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.http_config.custom_user_agent = Some(ua.into());
        self
    }

    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.connect_timeout = timeout;
        self
    }

    /// Set read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.read_timeout = timeout;
        self
    }

    /// Build ChatClient.
    pub fn build(self) -> Result<ChatClient> {
        let http_client = build_client(&self.http_config)?;

        Ok(ChatClient {
            inner: Arc::new(ChatClientInner {
                http: http_client,
                config: self.http_config,
                session: self.session,
            }),
        })
    }
}

/// Internal client state.
pub(crate) struct ChatClientInner {
    pub http: reqwest::Client,
    pub config: HttpConfig,
    pub session: Option<Session>,
}

impl ChatClientInner {
    /// Get the session token or error.
    pub fn require_token(&self) -> Result<&str> {
        self.session
            .as_ref()
            .filter(|s| s.is_valid())
            .map(|s| s.token.as_str())
            .ok_or(Error::AuthRequired)
    }

    /// Create an HTTP executor carrying the session token.
    pub fn authed_executor(&self) -> Result<HttpExecutor<'_>> {
        let token = self.require_token()?;
        Ok(HttpExecutor::new(&self.http, &self.config, Some(token)))
    }
}

/// Client for the chat service's HTTP API.
#[derive(Clone)]
pub struct ChatClient {
    pub(crate) inner: Arc<ChatClientInner>,
}

impl ChatClient {
    /// Create a new client builder.
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }

    /// Get the channel API.
    pub fn channels(&self) -> ChannelApi {
        ChannelApi::new(self.inner.clone())
    }

    /// Get the file upload API.
    pub fn files(&self) -> FileApi {
        FileApi::new(self.inner.clone())
    }

    /// Get the user API.
    pub fn users(&self) -> UserApi {
        UserApi::new(self.inner.clone())
    }

    /// Check if the client has a session.
    pub fn is_authenticated(&self) -> bool {
        self.inner.require_token().is_ok()
    }

    /// Get the current session.
    pub fn session(&self) -> Option<&Session> {
        self.inner.session.as_ref()
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("authenticated", &self.is_authenticated())
            .field("base_url", &self.inner.config.base_url)
            .finish()
    }
}
