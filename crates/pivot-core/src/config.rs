//! Typed startup configuration
//!
//! Loaded once from a toml file at process start and threaded explicitly to
//! every component that needs it; nothing reads configuration ambiently.
//! An unreadable or invalid file is fatal before the listener opens.

use crate::error::{PivotError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Whole process configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Service section: listener, stores, auth, secrets
    #[serde(default)]
    pub pivot: ServiceConfig,
    /// Cache section: backend selection and bounds
    #[serde(default)]
    pub cache: CacheSection,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Listener port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Document-store endpoints for users and link groups
    #[serde(default = "default_elasticsearch")]
    pub elasticsearch: Vec<String>,
    /// Document-store API key credential
    #[serde(default)]
    pub elasticsearch_api_key: Option<String>,
    /// Document-store `user:password` credential; ignored when an API key
    /// is set
    #[serde(default)]
    pub elasticsearch_basic_auth: Option<String>,
    /// Separate endpoints for the user store; absent means user documents
    /// share `elasticsearch`
    #[serde(default)]
    pub users_elasticsearch: Option<Vec<String>>,
    /// Master secret the per-user secret codec derives its key from
    #[serde(default = "default_password_secret")]
    pub password_secret: String,
    /// Header carrying the authenticated user name; absent means anonymous
    #[serde(default)]
    pub user_name_header: Option<String>,
    /// TLS private key path, terminated by the fronting listener
    #[serde(default)]
    pub key_file: Option<String>,
    /// TLS certificate path, terminated by the fronting listener
    #[serde(default)]
    pub cert_file: Option<String>,
    /// Base path the web app is mounted under
    #[serde(default = "default_web_base_path")]
    pub web_base_path: String,
    /// Maximum concurrent driver invocations per process
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            port: default_port(),
            elasticsearch: default_elasticsearch(),
            elasticsearch_api_key: None,
            elasticsearch_basic_auth: None,
            users_elasticsearch: None,
            password_secret: default_password_secret(),
            user_name_header: None,
            key_file: None,
            cert_file: None,
            web_base_path: default_web_base_path(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Cache backend selection and bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    /// Backend type; only "memory" ships in-process
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    /// Maximum resident entries before LRU eviction
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Default entry TTL in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl CacheSection {
    /// Default TTL as a [`Duration`]
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        CacheSection {
            backend: default_cache_backend(),
            max_entries: default_max_entries(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl Config {
    /// Read and parse the config file; any failure is a fatal
    /// [`PivotError::Config`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PivotError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e| {
            PivotError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

fn default_port() -> u16 {
    3218
}

fn default_elasticsearch() -> Vec<String> {
    vec!["http://localhost:9200".into()]
}

fn default_password_secret() -> String {
    "password".into()
}

fn default_web_base_path() -> String {
    "/".into()
}

fn default_max_concurrency() -> usize {
    10
}

fn default_cache_backend() -> String {
    "memory".into()
}

fn default_max_entries() -> usize {
    100_000
}

fn default_ttl_seconds() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_for_empty_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pivot.port, 3218);
        assert_eq!(config.cache.max_entries, 100_000);
        assert_eq!(config.cache.backend, "memory");
    }

    #[test]
    fn sections_override_defaults() {
        let config: Config = toml::from_str(
            r#"
            [pivot]
            port = 4000
            user_name_header = "x-remote-user"

            [cache]
            max_entries = 10
            ttl_seconds = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.pivot.port, 4000);
        assert_eq!(config.pivot.user_name_header.as_deref(), Some("x-remote-user"));
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn store_credentials_parse_and_default_to_none() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.pivot.elasticsearch_api_key.is_none());
        assert!(config.pivot.elasticsearch_basic_auth.is_none());
        assert!(config.pivot.users_elasticsearch.is_none());

        let config: Config = toml::from_str(
            r#"
            [pivot]
            elasticsearch = ["https://store:9200"]
            elasticsearch_api_key = "base64key"
            users_elasticsearch = ["https://users:9200"]
            "#,
        )
        .unwrap();
        assert_eq!(config.pivot.elasticsearch_api_key.as_deref(), Some("base64key"));
        assert_eq!(
            config.pivot.users_elasticsearch,
            Some(vec!["https://users:9200".to_string()])
        );
    }

    #[test]
    fn unreadable_file_is_config_error() {
        let err = Config::load("/nonexistent/pivot.toml").unwrap_err();
        assert!(matches!(err, PivotError::Config(_)));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pivot]\nport = \"not-a-port\"").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, PivotError::Config(_)));
    }
}
