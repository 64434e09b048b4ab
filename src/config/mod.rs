//! config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$GL_UNPROTECT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gl-unprotect/config.toml`
//! 3. `~/.gl-unprotect/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use gl_unprotect::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("timeout: {:?}", config.request_timeout());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, HostConfig};

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::gitlab::DEFAULT_TIMEOUT;
use crate::remote::RemoteIdentity;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GL_UNPROTECT_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    /// Path the configuration was read from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated.
    pub fn load() -> Result<Self, ConfigError> {
        let candidates = search_paths(
            std::env::var_os(CONFIG_ENV),
            std::env::var_os("XDG_CONFIG_HOME"),
            dirs::home_dir(),
        );

        match candidates.into_iter().find(|p| p.exists()) {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let global: GlobalConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        global.validate()?;

        Ok(Self {
            global,
            path: Some(path.to_path_buf()),
        })
    }

    /// Path the configuration was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Preferred remote name, if configured.
    pub fn remote(&self) -> Option<&str> {
        self.global.remote.as_deref()
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.global
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Token settings file, `~/.gl-unprotect/settings.json` unless overridden.
    pub fn token_file(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.global.token_file {
            return Ok(path.clone());
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".gl-unprotect").join("settings.json"))
    }

    /// API base URL for a remote, honoring per-host overrides.
    pub fn api_base(&self, remote: &RemoteIdentity) -> String {
        self.global
            .hosts
            .get(&remote.host)
            .and_then(|h| h.api_base.clone())
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| remote.api_base())
    }
}

/// Look up `key` in a dotenv-style file.
///
/// Lines are `KEY=value`. Blank lines and `#` comments are skipped, matching
/// quotes around the value are dropped, and the last assignment wins. A
/// missing file yields `None`.
pub fn env_file_value(path: &Path, key: &str) -> Result<Option<String>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    Ok(parse_env_value(&contents, key))
}

fn parse_env_value(contents: &str, key: &str) -> Option<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .filter(|(k, _)| k.trim() == key)
        .map(|(_, v)| unquote(v.trim()).to_string())
        .filter(|v| !v.is_empty())
        .last()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn search_paths(
    explicit: Option<OsString>,
    xdg_config_home: Option<OsString>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = explicit {
        paths.push(PathBuf::from(path));
    }
    if let Some(xdg) = xdg_config_home {
        paths.push(PathBuf::from(xdg).join("gl-unprotect").join("config.toml"));
    }
    if let Some(home) = home {
        paths.push(home.join(".gl-unprotect").join("config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::parse_remote_url;
    use tempfile::TempDir;

    #[test]
    fn search_order() {
        let paths = search_paths(
            Some("/etc/glu.toml".into()),
            Some("/xdg".into()),
            Some(PathBuf::from("/home/me")),
        );
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/etc/glu.toml"),
                PathBuf::from("/xdg/gl-unprotect/config.toml"),
                PathBuf::from("/home/me/.gl-unprotect/config.toml"),
            ]
        );
        assert!(search_paths(None, None, None).is_empty());
    }

    #[test]
    fn env_file_lookup() {
        let contents = "# local settings\n\nOTHER=1\nGITLAB_TOKEN = glpat-one\nGITLAB_TOKEN=\"glpat-two\"\nGITLAB_TOKEN=\n";
        assert_eq!(
            parse_env_value(contents, "GITLAB_TOKEN"),
            Some("glpat-two".to_string())
        );
        assert_eq!(parse_env_value(contents, "OTHER"), Some("1".to_string()));
        assert_eq!(parse_env_value("#GITLAB_TOKEN=x\n", "GITLAB_TOKEN"), None);
        assert_eq!(parse_env_value("A='b=c'\n", "A"), Some("b=c".to_string()));

        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".env");
        assert!(env_file_value(&path, "GITLAB_TOKEN").unwrap().is_none());
        fs::write(&path, "GITLAB_TOKEN=glpat-file\n").unwrap();
        assert_eq!(
            env_file_value(&path, "GITLAB_TOKEN").unwrap(),
            Some("glpat-file".to_string())
        );
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.remote(), None);
        assert!(config.path().is_none());
    }

    #[test]
    fn from_path_reads_and_validates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "remote = \"gitlab\"\nrequest_timeout_secs = 5\n").unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.remote(), Some("gitlab"));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.path(), Some(path.as_path()));

        fs::write(&path, "request_timeout_secs = 0\n").unwrap();
        assert!(matches!(
            Config::from_path(&path),
            Err(ConfigError::InvalidValue(_))
        ));

        fs::write(&path, "remote = [").unwrap();
        assert!(matches!(
            Config::from_path(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn api_base_override() {
        let mut config = Config::default();
        config.global.hosts.insert(
            "gitlab.internal".into(),
            HostConfig {
                api_base: Some("http://gitlab.internal:8080/api/v4/".into()),
            },
        );

        let internal = parse_remote_url("git@gitlab.internal:acme/widgets.git").unwrap();
        assert_eq!(config.api_base(&internal), "http://gitlab.internal:8080/api/v4");

        let public = parse_remote_url("https://gitlab.com/acme/widgets").unwrap();
        assert_eq!(config.api_base(&public), "https://gitlab.com/api/v4");
    }

    #[test]
    fn token_file_override() {
        let mut config = Config::default();
        config.global.token_file = Some(PathBuf::from("/tmp/tokens.json"));
        assert_eq!(config.token_file().unwrap(), PathBuf::from("/tmp/tokens.json"));
    }
}
