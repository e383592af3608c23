//! Configuration loading and validation
//!
//! The configuration is read from a TOML file and validated completely before
//! anything is constructed, so a bad file stops the process at startup.

use anyhow::{bail, ensure, Context, Result};
use fms_bridge::{ChangePolicy, ClientConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Smallest accepted sync interval
pub const MIN_INTERVAL_MS: u64 = 30_000;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Status-tracking service the status is read from
    pub source: EndpointConfig,
    /// Dispatch service the status is written to
    pub target: EndpointConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    pub source_ids: IdList,
    pub target_ids: IdList,
    /// Also push when only the position changed
    #[serde(default)]
    pub track_position: bool,
}

/// Vehicle ids, either as a TOML array or as one comma-separated string
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IdList {
    List(Vec<String>),
    Csv(String), // "v1, v2, v3"
}

impl IdList {
    /// Trimmed ids in order, blank entries dropped
    pub fn ids(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            IdList::List(items) => items.iter().map(String::as_str).collect(),
            IdList::Csv(joined) => joined.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn default_interval() -> u64 {
    60_000
}

fn default_request_timeout() -> u64 {
    10_000
}

impl AppConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can be checked without touching the network
    pub fn validate(&self) -> Result<()> {
        validate_endpoint("source", &self.source)?;
        validate_endpoint("target", &self.target)?;

        let sync = &self.sync;
        ensure!(
            sync.interval_ms >= MIN_INTERVAL_MS,
            "sync.interval_ms must be at least {} ms, got {}",
            MIN_INTERVAL_MS,
            sync.interval_ms
        );
        ensure!(
            sync.request_timeout_ms > 0 && sync.request_timeout_ms < sync.interval_ms,
            "sync.request_timeout_ms must be between 1 and {} ms, got {}",
            sync.interval_ms - 1,
            sync.request_timeout_ms
        );

        let source_ids = sync.source_ids.ids();
        let target_ids = sync.target_ids.ids();
        ensure!(!source_ids.is_empty(), "sync.source_ids must not be empty");
        ensure!(!target_ids.is_empty(), "sync.target_ids must not be empty");
        if source_ids.len() != target_ids.len() {
            bail!(
                "sync.source_ids has {} entries but sync.target_ids has {}",
                source_ids.len(),
                target_ids.len()
            );
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.sync.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.sync.request_timeout_ms)
    }

    pub fn change_policy(&self) -> ChangePolicy {
        if self.sync.track_position {
            ChangePolicy::StatusAndPosition
        } else {
            ChangePolicy::StatusOnly
        }
    }

    pub fn source_client(&self) -> ClientConfig {
        ClientConfig::new(&self.source.base_url, &self.source.api_key)
            .with_timeout(self.request_timeout())
    }

    pub fn target_client(&self) -> ClientConfig {
        ClientConfig::new(&self.target.base_url, &self.target.api_key)
            .with_timeout(self.request_timeout())
    }
}

fn validate_endpoint(section: &str, endpoint: &EndpointConfig) -> Result<()> {
    ensure!(
        !endpoint.base_url.trim().is_empty(),
        "{}.base_url must not be empty",
        section
    );
    ensure!(
        !endpoint.api_key.trim().is_empty(),
        "{}.api_key must not be empty",
        section
    );
    fms_bridge::client::parse_base_url(&endpoint.base_url)
        .with_context(|| format!("{}.base_url is invalid", section))?;
    Ok(())
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    AppConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid config file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"
        [source]
        base_url = "https://source.example.com"
        api_key = "access"

        [target]
        base_url = "https://target.example.com"
        api_key = "token"

        [sync]
        interval_ms = 45000
        source_ids = ["v1", " v2 "]
        target_ids = ["c1", "c2"]
    "#;

    fn with_sync(sync: &str) -> String {
        format!(
            r#"
            [source]
            base_url = "https://source.example.com"
            api_key = "access"

            [target]
            base_url = "https://target.example.com"
            api_key = "token"

            [sync]
            {}
            "#,
            sync
        )
    }

    #[test]
    fn test_config_deserialization() {
        let config = AppConfig::from_toml_str(VALID).unwrap();

        assert_eq!(config.interval(), Duration::from_secs(45));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.sync.source_ids.ids(), vec!["v1", "v2"]);
        assert_eq!(config.change_policy(), ChangePolicy::StatusOnly);
        assert_eq!(config.source_client().api_key, "access");
        assert_eq!(config.target_client().timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_comma_separated_ids() {
        let config = AppConfig::from_toml_str(&with_sync(
            r#"
            source_ids = "v1, v2,,v3"
            target_ids = ["c1", "c2", "c3"]
            track_position = true
            "#,
        ))
        .unwrap();

        assert_eq!(config.sync.source_ids.ids(), vec!["v1", "v2", "v3"]);
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.change_policy(), ChangePolicy::StatusAndPosition);
    }

    #[test]
    fn test_interval_minimum() {
        let result = AppConfig::from_toml_str(&with_sync(
            r#"
            interval_ms = 29999
            source_ids = ["v1"]
            target_ids = ["c1"]
            "#,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_must_fit_interval() {
        let result = AppConfig::from_toml_str(&with_sync(
            r#"
            interval_ms = 30000
            request_timeout_ms = 30000
            source_ids = ["v1"]
            target_ids = ["c1"]
            "#,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_id_lists_must_match() {
        let mismatch = AppConfig::from_toml_str(&with_sync(
            r#"
            source_ids = ["v1", "v2"]
            target_ids = ["c1"]
            "#,
        ));
        assert!(mismatch.is_err());

        let empty = AppConfig::from_toml_str(&with_sync(
            r#"
            source_ids = []
            target_ids = []
            "#,
        ));
        assert!(empty.is_err());
    }

    #[test]
    fn test_endpoint_validation() {
        let missing_key = VALID.replace(r#"api_key = "token""#, r#"api_key = " ""#);
        assert!(AppConfig::from_toml_str(&missing_key).is_err());

        let bad_url = VALID.replace("https://target.example.com", "target.example.com");
        assert!(AppConfig::from_toml_str(&bad_url).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.sync.target_ids.ids(), vec!["c1", "c2"]);
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(&dir.path().join("missing.toml"));

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to read config file"));
    }
}
