//! gitlab::transport
//!
//! HTTP transport seam for the GitLab client.
//!
//! # Design
//!
//! [`GitLabClient`](super::GitLabClient) builds fully-formed requests and
//! hands them to an [`HttpTransport`]. The production transport wraps
//! `reqwest` with a bounded timeout; tests substitute their own
//! implementation so the client can be exercised without a socket.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP methods used by the GitLab client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A fully-built HTTP request.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body
    pub body: Option<Vec<u8>>,
}

// Header values are elided; one of them is the access token
impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &header_names)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish()
    }
}

impl HttpRequest {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A raw HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any HTTP response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),
}

/// Sends HTTP requests.
///
/// Implementations must return `Ok` for every response the server produced,
/// whatever its status; only failures to get a response are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the given per-request timeout.
    ///
    /// Redirects are never followed. A 3xx is returned like any other
    /// response, and the token only goes to the configured API base.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("gl-unprotect/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let timeout = self.timeout;
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Network(e.to_string())
            }
        };

        let response = builder.send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes().await.map_err(map_err)?.to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
