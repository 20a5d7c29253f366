//! HTTP client configuration and request execution.

use crate::error::{Error, Result};
use reqwest::{multipart, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.revolt.chat/";

/// Default file server base URL.
pub const DEFAULT_FILES_URL: &str = "https://autumn.revolt.chat/";

/// Header carrying the session token.
pub const SESSION_HEADER: &str = "x-session-token";

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("revsync/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL for API requests.
    pub base_url: String,
    /// Base URL for file uploads.
    pub files_url: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Read timeout.
    pub read_timeout: Duration,
    /// Custom user agent.
    pub custom_user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            files_url: DEFAULT_FILES_URL.to_owned(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(20),
            custom_user_agent: None,
        }
    }
}

impl HttpConfig {
    /// User agent to send.
    pub fn user_agent(&self) -> &str {
        self.custom_user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Resolve a relative API path to a full URL.
    pub fn resolve_url(&self, path: &str) -> Result<Url> {
        resolve(&self.base_url, path)
    }

    /// Resolve a relative file server path to a full URL.
    pub fn resolve_files_url(&self, path: &str) -> Result<Url> {
        resolve(&self.files_url, path)
    }
}

fn resolve(base: &str, path: &str) -> Result<Url> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Url::parse(path).map_err(Error::Url);
    }

    // Url::join drops the last segment of a base without a trailing slash.
    let base = if base.ends_with('/') {
        Url::parse(base)
    } else {
        Url::parse(&format!("{}/", base))
    };

    base.and_then(|b| b.join(path.trim_start_matches('/')))
        .map_err(Error::Url)
}

/// Build a reqwest client with the given configuration.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .user_agent(config.user_agent())
        .gzip(true)
        .build()
        .map_err(Error::Network)
}

/// HTTP request executor.
pub struct HttpExecutor<'a> {
    client: &'a Client,
    config: &'a HttpConfig,
    token: Option<&'a str>,
}

impl<'a> HttpExecutor<'a> {
    /// Create a new executor.
    pub fn new(client: &'a Client, config: &'a HttpConfig, token: Option<&'a str>) -> Self {
        Self {
            client,
            config,
            token,
        }
    }

    /// Build a request with common headers.
    fn build_request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match self.token {
            Some(token) => request.header(SESSION_HEADER, token),
            None => request,
        }
    }

    /// Execute a GET request and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.config.resolve_url(path)?;
        let response = self
            .build_request(Method::GET, url)
            .query(query)
            .send()
            .await
            .map_err(Error::Network)?;

        let text = self.handle_response(response).await?;
        parse_json_response(&text)
    }

    /// Execute a request with an optional JSON body, ignoring the response body.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        let url = self.config.resolve_url(path)?;
        let mut request = self.build_request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(Error::Network)?;
        self.handle_response(response).await?;
        Ok(())
    }

    /// Upload a file as multipart form data to the file server.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<T> {
        let url = self.config.resolve_files_url(path)?;
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_owned())
            .mime_str(content_type)
            .map_err(|_| Error::invalid(format!("Bad content type: {}", content_type)))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .build_request(Method::POST, url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::Network)?;

        let text = self.handle_response(response).await?;
        parse_json_response(&text)
    }

    /// Read the response body, mapping error statuses.
    async fn handle_response(&self, response: Response) -> Result<String> {
        let status = response.status();
        let text = response.text().await.map_err(Error::Network)?;

        if !status.is_success() {
            let message = error_type(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_owned());
            return Err(Error::api(status.as_u16(), message));
        }

        Ok(text)
    }
}

/// Extract the `type` field of an error body like `{"type": "NotFound"}`.
fn error_type(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("type")?.as_str().map(str::to_owned)
}

/// Parse a JSON response body.
fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| Error::parse(format!("{}: {}", e, truncate(text, 200))))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
