//! secrets::traits
//!
//! Token storage trait definition.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include tokens in error messages
//! - Be thread-safe (Send + Sync)

use thiserror::Error;

/// Errors from token storage operations.
///
/// Error messages never include token values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from token storage.
    #[error("failed to read token store: {0}")]
    ReadError(String),

    /// Failed to write to token storage.
    #[error("failed to write token store: {0}")]
    WriteError(String),
}

/// Per-host GitLab token storage.
///
/// Keys are GitLab host names exactly as parsed from the remote URL
/// (e.g. `gitlab.example.com`).
pub trait TokenStore: Send + Sync {
    /// Token for `host`.
    ///
    /// Returns `Ok(None)` when no token is stored or the user declined to
    /// store one.
    fn get_token(&self, host: &str) -> Result<Option<String>, SecretError>;

    /// Store a token for `host`, overwriting any previous entry.
    fn set_token(&self, host: &str, token: &str) -> Result<(), SecretError>;

    /// Remove the entry for `host`.
    ///
    /// Idempotent: deleting a missing entry succeeds.
    fn delete_token(&self, host: &str) -> Result<(), SecretError>;

    /// Every host with an entry, sorted.
    fn hosts(&self) -> Result<Vec<String>, SecretError>;
}
