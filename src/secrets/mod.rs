//! secrets
//!
//! Per-host GitLab token storage.
//!
//! # Architecture
//!
//! Tokens are stored through the [`TokenStore`] trait. [`FileTokenStore`]
//! keeps them in a JSON settings file (`~/.gl-unprotect/settings.json` by
//! default, overridable with the `token_file` config key).
//!
//! # Security
//!
//! - Tokens are never logged or included in error messages
//! - The file store uses 0600 permissions on Unix
//! - All writes are atomic (temp file + rename)
//!
//! # Example
//!
//! ```ignore
//! use gl_unprotect::secrets::{FileTokenStore, TokenStore};
//!
//! let store = FileTokenStore::new()?;
//! store.set_token("gitlab.example.com", "glpat-...")?;
//! if let Some(token) = store.get_token("gitlab.example.com")? {
//!     // Use token (never print it!)
//! }
//! ```

mod file_store;
mod traits;

pub use file_store::FileTokenStore;
pub use traits::{SecretError, TokenStore};
