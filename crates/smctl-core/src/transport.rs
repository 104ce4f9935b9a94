//! HTTP transport abstraction
//!
//! The registration client and the operation waiter only ever talk to a
//! [`Transport`]. [`HttpTransport`] is the production implementation over
//! reqwest; tests substitute scripted transports or point it at a mock server.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use tracing::{debug, error, trace};

/// User agent string for smctl HTTP requests
const SMCTL_USER_AGENT: &str = concat!("smctl/", env!("CARGO_PKG_VERSION"));

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// HTTP methods used against the management endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Put => write!(f, "PUT"),
        }
    }
}

/// A request relative to the management endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Path plus query string, always starting with `/`
    pub path_and_query: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header, compared case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and body of a completed round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn any non-2xx response into [`CoreError::Transport`]
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CoreError::Transport {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Something that can carry a request to the management endpoint
///
/// Implementations return every response they receive, whatever its
/// status. Only failures to obtain a response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// How requests authenticate against the endpoint
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// PEM file holding the management certificate and its private key
    Certificate(PathBuf),
    /// Bearer token
    Token(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Certificate(path) => f.debug_tuple("Certificate").field(path).finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"***").finish(),
        }
    }
}

/// Truncate a response body before it goes to the log
fn sanitize_for_log(body: &str) -> String {
    let truncated = match body.char_indices().nth(MAX_LOG_BODY_LENGTH) {
        Some((idx, _)) => format!("{}... [truncated, {} bytes total]", &body[..idx], body.len()),
        None => body.to_string(),
    };
    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl HttpTransport {
    /// Build a transport for `endpoint` authenticating with `credentials`
    pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self> {
        let endpoint = endpoint.trim_end_matches('/');
        url::Url::parse(endpoint)
            .map_err(|e| CoreError::Validation(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        let mut builder = Client::builder().user_agent(SMCTL_USER_AGENT);
        let mut token = None;

        match credentials {
            Credentials::Certificate(path) => {
                debug!("Using management certificate from {}", path.display());
                let pem = std::fs::read(&path).map_err(|e| {
                    CoreError::Validation(format!(
                        "Failed to read certificate {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                    CoreError::Validation(format!(
                        "Certificate {} is not a PEM certificate with private key: {}",
                        path.display(),
                        e
                    ))
                })?;
                builder = builder.identity(identity);
            }
            Credentials::Token(value) => {
                debug!("Using bearer token authentication");
                token = Some(value);
            }
        }

        let client = builder
            .build()
            .map_err(|e| CoreError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: endpoint.to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, request.path_and_query);
        debug!("{} {}", request.method, url);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            // Action calls carry no payload but the endpoint wants a length
            HttpMethod::Put => self.client.put(&url).body(""),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            error!("{} {} failed: {}", request.method, url, e);
            CoreError::Connection(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Connection(format!("Failed to read response body: {}", e)))?;

        if (200..300).contains(&status) {
            trace!("{} {} -> {}", request.method, url, status);
        } else {
            debug!(
                "{} {} -> {}: {}",
                request.method,
                url,
                status,
                sanitize_for_log(&body)
            );
        }

        Ok(HttpResponse { status, body })
    }
}
