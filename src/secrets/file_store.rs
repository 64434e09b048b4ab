//! secrets::file_store
//!
//! File-based token storage.
//!
//! # Format
//!
//! ```json
//! {
//!   "tokens": {
//!     "gitlab.example.com": "glpat-...",
//!     "gitlab.internal": false
//!   }
//! }
//! ```
//!
//! A `false` entry records that the user declined to store a token for that
//! host; it reads as "no token". Unknown top-level keys are preserved.
//!
//! # Security
//!
//! - File permissions are set to 0600 on Unix (owner read/write only)
//! - All writes are atomic (write to temp file, then rename)
//! - Tokens are never logged, printed, or included in error messages

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use serde::{Deserialize, Serialize};

use super::traits::{SecretError, TokenStore};

/// One `tokens` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum TokenEntry {
    Token(String),
    Declined(bool),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    tokens: BTreeMap<String, TokenEntry>,
    #[serde(flatten)]
    other: serde_json::Map<String, serde_json::Value>,
}

/// File-based token storage.
#[derive(Debug)]
pub struct FileTokenStore {
    /// Path to the settings file
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store at the default location, `~/.gl-unprotect/settings.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self::with_path(home.join(".gl-unprotect").join("settings.json")))
    }

    /// Create a store at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record that the user declined to store a token for `host`.
    pub fn decline_token(&self, host: &str) -> Result<(), SecretError> {
        let mut settings = self.read_settings()?;
        settings
            .tokens
            .insert(host.to_string(), TokenEntry::Declined(false));
        self.write_settings(&settings)
    }

    /// Whether the user previously declined to store a token for `host`.
    pub fn is_declined(&self, host: &str) -> Result<bool, SecretError> {
        let settings = self.read_settings()?;
        Ok(matches!(
            settings.tokens.get(host),
            Some(TokenEntry::Declined(false))
        ))
    }

    fn read_settings(&self) -> Result<SettingsFile, SecretError> {
        if !self.path.exists() {
            return Ok(SettingsFile::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read settings file: {}", e)))?;
        if content.trim().is_empty() {
            return Ok(SettingsFile::default());
        }

        // Position only: type errors from serde_json quote the offending value
        serde_json::from_str(&content).map_err(|e| {
            SecretError::ReadError(format!(
                "cannot parse settings file at line {} column {}",
                e.line(),
                e.column()
            ))
        })
    }

    fn write_settings(&self, settings: &SettingsFile) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| SecretError::WriteError(format!("cannot serialize settings: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {}", e)))?;

            // Restrict permissions before any token hits the disk
            #[cfg(unix)]
            {
                let permissions = fs::Permissions::from_mode(0o600);
                file.set_permissions(permissions).map_err(|e| {
                    SecretError::WriteError(format!("cannot set permissions: {}", e))
                })?;
            }

            file.write_all(content.as_bytes())
                .map_err(|e| SecretError::WriteError(format!("cannot write settings: {}", e)))?;
            file.sync_all()
                .map_err(|e| SecretError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot rename temp file: {}", e)))?;

        Ok(())
    }

    /// Verify file permissions are correct (Unix only).
    ///
    /// Returns true if the file doesn't exist or has 0600 permissions.
    #[cfg(unix)]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        if !self.path.exists() {
            return Ok(true);
        }

        let metadata = fs::metadata(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read file metadata: {}", e)))?;
        Ok(metadata.permissions().mode() & 0o777 == 0o600)
    }

    #[cfg(not(unix))]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        Ok(true)
    }
}

impl TokenStore for FileTokenStore {
    fn get_token(&self, host: &str) -> Result<Option<String>, SecretError> {
        let settings = self.read_settings()?;
        Ok(match settings.tokens.get(host) {
            Some(TokenEntry::Token(token)) if !token.is_empty() => Some(token.clone()),
            _ => None,
        })
    }

    fn set_token(&self, host: &str, token: &str) -> Result<(), SecretError> {
        let mut settings = self.read_settings()?;
        settings
            .tokens
            .insert(host.to_string(), TokenEntry::Token(token.to_string()));
        self.write_settings(&settings)
    }

    fn delete_token(&self, host: &str) -> Result<(), SecretError> {
        let mut settings = self.read_settings()?;
        if settings.tokens.remove(host).is_none() {
            return Ok(());
        }
        self.write_settings(&settings)
    }

    fn hosts(&self) -> Result<Vec<String>, SecretError> {
        let settings = self.read_settings()?;
        Ok(settings.tokens.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileTokenStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileTokenStore::with_path(temp.path().join("settings.json"));
        (temp, store)
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let (_temp, store) = create_test_store();
        assert!(store.get_token("gitlab.com").expect("get").is_none());
    }

    #[test]
    fn set_and_get() {
        let (_temp, store) = create_test_store();

        store.set_token("gitlab.example.com", "glpat-abc").expect("set");

        assert_eq!(
            store.get_token("gitlab.example.com").expect("get"),
            Some("glpat-abc".to_string())
        );
        assert!(store.get_token("gitlab.com").expect("get other").is_none());
    }

    #[test]
    fn set_overwrites() {
        let (_temp, store) = create_test_store();

        store.set_token("gitlab.com", "one").expect("first set");
        store.set_token("gitlab.com", "two").expect("second set");

        assert_eq!(store.get_token("gitlab.com").expect("get"), Some("two".into()));
    }

    #[test]
    fn delete_existing_and_missing() {
        let (_temp, store) = create_test_store();

        store.set_token("gitlab.com", "x").expect("set");
        store.delete_token("gitlab.com").expect("delete");
        assert!(store.get_token("gitlab.com").expect("get").is_none());

        store.delete_token("gitlab.com").expect("delete again");
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn declined_reads_as_absent() {
        let (_temp, store) = create_test_store();

        store.decline_token("gitlab.internal").expect("decline");

        assert!(store.get_token("gitlab.internal").expect("get").is_none());
        assert!(store.is_declined("gitlab.internal").expect("declined"));
        assert_eq!(store.hosts().expect("hosts"), vec!["gitlab.internal"]);
    }

    #[test]
    fn reads_existing_settings_file() {
        let (_temp, store) = create_test_store();
        fs::write(
            store.path(),
            r#"{ "tokens": { "gitlab.example.com": "glpat-1", "gitlab.internal": false } }"#,
        )
        .expect("write");

        assert_eq!(
            store.get_token("gitlab.example.com").expect("get"),
            Some("glpat-1".into())
        );
        assert!(store.get_token("gitlab.internal").expect("get").is_none());
    }

    #[test]
    fn missing_tokens_key_and_extra_fields() {
        let (_temp, store) = create_test_store();
        fs::write(store.path(), r#"{ "theme": "dark" }"#).expect("write");

        assert!(store.get_token("gitlab.com").expect("get").is_none());
        store.set_token("gitlab.com", "t").expect("set");

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["tokens"]["gitlab.com"], "t");
    }

    #[test]
    fn creates_directory_if_missing() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("subdir").join("settings.json");
        let store = FileTokenStore::with_path(path.clone());

        assert!(!path.parent().unwrap().exists());
        store.set_token("gitlab.com", "t").expect("set");
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn permissions_0600_on_unix() {
        let (_temp, store) = create_test_store();
        assert!(store.verify_permissions().expect("verify before write"));

        store.set_token("gitlab.com", "t").expect("set");

        let mode = fs::metadata(store.path()).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "permissions should be 0600");
        assert!(store.verify_permissions().expect("verify"));
    }

    #[test]
    fn parse_error_does_not_leak_contents() {
        let (_temp, store) = create_test_store();
        fs::write(store.path(), r#"{ "tokens": { "gitlab.com": "glpat-secret" "#).expect("write");

        let err = store.get_token("gitlab.com").unwrap_err().to_string();
        assert!(err.contains("cannot parse"), "{}", err);
        assert!(!err.contains("glpat-secret"));
    }

    #[test]
    fn persistence_across_instances() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("settings.json");

        FileTokenStore::with_path(path.clone())
            .set_token("gitlab.com", "t")
            .expect("set");

        let store = FileTokenStore::with_path(path);
        assert_eq!(store.get_token("gitlab.com").expect("get"), Some("t".into()));
    }
}
