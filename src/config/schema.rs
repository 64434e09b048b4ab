//! config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: the timeout must be positive and
//! every API base override must be an absolute `http`/`https` URL.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// remote = "origin"
/// request_timeout_secs = 30
/// token_file = "/home/me/.gl-unprotect/settings.json"
///
/// [hosts."gitlab.internal"]
/// api_base = "http://gitlab.internal:8080/api/v4"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Preferred remote name
    pub remote: Option<String>,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: Option<u64>,

    /// Token settings file
    pub token_file: Option<PathBuf>,

    /// Per-host overrides, keyed by host as it appears in the remote URL
    pub hosts: BTreeMap<String, HostConfig>,
}

/// Settings for one GitLab host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// API root, e.g. `https://gitlab.example.com/api/v4`
    pub api_base: Option<String>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(remote) = &self.remote {
            if remote.trim().is_empty() {
                return Err(ConfigError::InvalidValue("remote must not be empty".into()));
            }
        }

        for (host, cfg) in &self.hosts {
            if let Some(api_base) = &cfg.api_base {
                let url = Url::parse(api_base).map_err(|e| {
                    ConfigError::InvalidValue(format!(
                        "hosts.\"{}\".api_base '{}': {}",
                        host, api_base, e
                    ))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ConfigError::InvalidValue(format!(
                        "hosts.\"{}\".api_base must use http or https, got '{}'",
                        host,
                        url.scheme()
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: GlobalConfig = toml::from_str(
            r#"
            remote = "gitlab"
            request_timeout_secs = 10
            token_file = "/tmp/settings.json"

            [hosts."gitlab.internal"]
            api_base = "http://gitlab.internal:8080/api/v4"
            "#,
        )
        .unwrap();

        assert_eq!(config.remote.as_deref(), Some("gitlab"));
        assert_eq!(config.request_timeout_secs, Some(10));
        assert_eq!(
            config.hosts["gitlab.internal"].api_base.as_deref(),
            Some("http://gitlab.internal:8080/api/v4")
        );
        config.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_keys() {
        let result: Result<GlobalConfig, _> = toml::from_str("remtoe = \"origin\"");
        assert!(result.is_err());
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let config = GlobalConfig {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(msg)) if msg.contains("request_timeout_secs")
        ));
    }

    #[test]
    fn api_base_must_be_http() {
        let mut config = GlobalConfig::default();
        config.hosts.insert(
            "gitlab.com".into(),
            HostConfig {
                api_base: Some("ftp://gitlab.com/api/v4".into()),
            },
        );
        assert!(config.validate().is_err());

        config.hosts.insert(
            "gitlab.com".into(),
            HostConfig {
                api_base: Some("not a url".into()),
            },
        );
        assert!(config.validate().is_err());
    }
}
