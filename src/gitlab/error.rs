//! gitlab::error
//!
//! Errors and response bodies from GitLab API calls.
//!
//! Non-2xx responses are never collapsed into a string: the parsed JSON
//! (or raw text) body travels with the error so callers can branch on
//! GitLab's structured `{"message": ...}` payloads.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Body of an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No body was returned (e.g. `204 No Content`)
    Empty,
    /// Body parsed as JSON
    Json(serde_json::Value),
    /// Body kept as text (text content-type, or JSON that failed to parse)
    Text(String),
}

impl ResponseBody {
    /// Decode raw bytes according to the response content-type.
    ///
    /// Content types starting with `text` are kept as text. Everything else
    /// is parsed as JSON, falling back to text when parsing fails.
    pub fn decode(content_type: Option<&str>, bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return ResponseBody::Empty;
        }

        let text = String::from_utf8_lossy(bytes);
        let is_text = content_type
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("text"))
            .unwrap_or(false);
        if is_text {
            return ResponseBody::Text(text.into_owned());
        }

        match serde_json::from_slice(bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text.into_owned()),
        }
    }

    /// Best-effort human-readable message.
    ///
    /// GitLab reports errors as `{"message": ...}` (string or object) or
    /// `{"error": "..."}`.
    pub fn message(&self) -> String {
        match self {
            ResponseBody::Empty => "empty response".to_string(),
            ResponseBody::Text(text) => text.trim().to_string(),
            ResponseBody::Json(value) => match value.get("message").or_else(|| value.get("error")) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => value.to_string(),
            },
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Errors from GitLab API operations.
#[derive(Debug, Clone, Error)]
pub enum GitLabError {
    /// The resource does not exist (HTTP 404).
    ///
    /// For protected-branch reads this means "branch is unprotected" and is
    /// an expected outcome.
    #[error("not found: {resource}")]
    NotFound {
        /// Request path that returned 404
        resource: String,
        /// Response body
        body: ResponseBody,
    },

    /// GitLab returned a non-2xx status other than an expected 404.
    #[error("GitLab API error: {status} - {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Parsed or raw response body
        body: ResponseBody,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Network or connection error.
    #[error("network error: {0}")]
    Transport(String),

    /// A 2xx response body did not have the expected shape.
    #[error("unexpected response from GitLab: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("invalid GitLab URL: {0}")]
    InvalidUrl(String),
}

impl GitLabError {
    /// Whether this is a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GitLabError::NotFound { .. })
    }

    /// HTTP status code, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitLabError::NotFound { .. } => Some(404),
            GitLabError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a manual retry could plausibly succeed.
    ///
    /// Network failures, timeouts, rate limiting, and server errors are
    /// transient; client errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            GitLabError::Timeout(_) | GitLabError::Transport(_) => true,
            GitLabError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
