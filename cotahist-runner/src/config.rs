//! Run configuration.
//!
//! A [`SyncConfig`] is built once by the entry point (TOML file plus CLI
//! overrides) and passed explicitly to every orchestrator.

use cotahist_core::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CATALOG_URL: &str =
    "https://bvmf.bmfbovespa.com.br/pt-br/cotacoes-historicas/FormSeriesHistoricasArq.asp";
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://bvmf.bmfbovespa.com.br/InstDados/SerHist";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What a batch does when one item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failure; the failed item and everything after it
    /// are left for the next run.
    AbortBatch,
    /// Record the failure and move on to the next item.
    SkipItem,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::AbortBatch => write!(f, "abort-batch"),
            FailurePolicy::SkipItem => write!(f, "skip-item"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub storage_backend: StorageBackend,
    /// Directory for `local`, `bucket[/prefix]` for `object-store`.
    pub storage_root: String,
    pub download_budget_secs: u64,
    pub convert_budget_secs: u64,
    pub download_policy: FailurePolicy,
    pub convert_policy: FailurePolicy,
    pub catalog_url: String,
    pub download_base_url: String,
    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Local,
            storage_root: "data".into(),
            download_budget_secs: 4 * 60,
            convert_budget_secs: 3 * 60,
            download_policy: FailurePolicy::AbortBatch,
            convert_policy: FailurePolicy::SkipItem,
            catalog_url: DEFAULT_CATALOG_URL.into(),
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.into(),
            log_level: "info".into(),
        }
    }
}

impl SyncConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string. Missing keys take
    /// their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_root.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_root must not be empty".into()));
        }
        for (key, url) in [
            ("catalog_url", &self.catalog_url),
            ("download_base_url", &self.download_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }

    pub fn download_budget(&self) -> Duration {
        Duration::from_secs(self.download_budget_secs)
    }

    pub fn convert_budget(&self) -> Duration {
        Duration::from_secs(self.convert_budget_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = SyncConfig::from_toml("").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.download_budget(), Duration::from_secs(240));
        assert_eq!(config.convert_budget(), Duration::from_secs(180));
        assert_eq!(config.download_policy, FailurePolicy::AbortBatch);
        assert_eq!(config.convert_policy, FailurePolicy::SkipItem);
    }

    #[test]
    fn full_toml_parses() {
        let config = SyncConfig::from_toml(
            r#"
            storage_backend = "object-store"
            storage_root = "market-data/b3"
            download_budget_secs = 60
            convert_budget_secs = 0
            download_policy = "skip-item"
            convert_policy = "abort-batch"
            catalog_url = "http://localhost:8080/listing"
            download_base_url = "http://localhost:8080/files"
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage_backend, StorageBackend::ObjectStore);
        assert_eq!(config.storage_root, "market-data/b3");
        assert_eq!(config.convert_budget(), Duration::ZERO);
        assert_eq!(config.download_policy, FailurePolicy::SkipItem);
        assert_eq!(config.convert_policy, FailurePolicy::AbortBatch);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn unknown_keys_and_values_are_rejected() {
        assert!(matches!(
            SyncConfig::from_toml("fs_type = \"local\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SyncConfig::from_toml("download_policy = \"retry\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn empty_root_is_invalid() {
        assert!(matches!(
            SyncConfig::from_toml("storage_root = \"  \""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn non_http_urls_are_invalid() {
        let err = SyncConfig::from_toml("catalog_url = \"ftp://example.invalid\"").unwrap_err();
        assert!(err.to_string().contains("catalog_url"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let path = std::env::temp_dir().join("cotahist_no_such_config.toml");
        assert!(matches!(
            SyncConfig::from_file(&path),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn policy_display_matches_config_values() {
        assert_eq!(FailurePolicy::AbortBatch.to_string(), "abort-batch");
        assert_eq!(FailurePolicy::SkipItem.to_string(), "skip-item");
    }
}
