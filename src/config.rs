//! Configuration Management
//!
//! Handles persistent configuration storage for mcclient: the endpoint
//! catalog, credentials and request defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_TOKEN: &str = "MCCLIENT_TOKEN";
pub const ENV_API_VERSION: &str = "MCCLIENT_API_VERSION";

pub const DEFAULT_ENDPOINT_TYPE: &str = "publicURL";
const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// One service in the endpoint catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    /// Public URL, may end with a version segment such as `/v2`
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_url: Option<String>,
}

impl EndpointConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            internal_url: None,
        }
    }
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Access token sent as X-Auth-Token
    #[serde(default)]
    pub token: Option<String>,
    /// API version used for module lookup and endpoint selection
    #[serde(default)]
    pub api_version: Option<String>,
    /// publicURL or internalURL
    #[serde(default)]
    pub endpoint_type: Option<String>,
    /// Service type -> endpoint
    #[serde(default)]
    pub endpoints: HashMap<String, EndpointConfig>,
    /// Roles granted by the token
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Accept invalid TLS certificates
    #[serde(default)]
    pub insecure: bool,
}

impl Config {
    /// Get the config directory
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mcclient"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(dir) = Self::config_dir() else {
            return Self::default();
        };

        for name in ["config.json", "config.yaml", "config.yml"] {
            let path = dir.join(name);
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config {:?}: {:#}", path, e);
                    return Self::default();
                },
            }
        }

        Self::default()
    }

    /// Load configuration from an explicit path (JSON or YAML by extension)
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        if is_yaml {
            serde_yaml::from_str(content).context("Failed to parse YAML config")
        } else {
            serde_json::from_str(content).context("Failed to parse JSON config")
        }
    }

    /// Apply environment overrides (env > config file)
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Ok(version) = std::env::var(ENV_API_VERSION) {
            self.api_version = Some(version);
        }
    }

    pub fn effective_endpoint_type(&self) -> String {
        self.endpoint_type
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT_TYPE.to_string())
    }

    pub fn effective_api_version(&self) -> String {
        self.api_version.clone().unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Add or replace a catalog entry
    pub fn with_endpoint(mut self, service_type: &str, url: &str) -> Self {
        self.endpoints
            .insert(service_type.to_string(), EndpointConfig::new(url));
        self
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_config() {
        let content = r#"{
            "token": "abc",
            "endpoints": {
                "compute_v2": {"url": "https://cloud.example.com:8889/api/v2"}
            },
            "roles": ["admin"]
        }"#;
        let config = Config::parse(content, Path::new("config.json")).unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(
            config.endpoints["compute_v2"].url,
            "https://cloud.example.com:8889/api/v2"
        );
        assert!(config.is_admin());
        assert_eq!(config.effective_endpoint_type(), DEFAULT_ENDPOINT_TYPE);
    }

    #[test]
    fn test_parse_yaml_config() {
        let content = "api_version: v2\nendpoint_type: internalURL\nendpoints:\n  image:\n    url: https://img.example.com/v1\n    internal_url: http://10.0.0.1:9292/v1\n";
        let config = Config::parse(content, Path::new("config.yaml")).unwrap();
        assert_eq!(config.effective_api_version(), "v2");
        assert_eq!(config.effective_endpoint_type(), "internalURL");
        assert_eq!(
            config.endpoints["image"].internal_url.as_deref(),
            Some("http://10.0.0.1:9292/v1")
        );
        assert!(!config.is_admin());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let content = r#"{"token": "abc", "region": "cn-north", "project": "p1"}"#;
        let config = Config::parse(content, Path::new("config.json")).unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn test_default_timeout() {
        let config = Config::default();
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
