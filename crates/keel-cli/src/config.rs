//! CLI configuration

use std::path::{Path, PathBuf};

use keel_host::ExecutorConfig;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Settings read from `~/.keel/config.toml`, or the file given with `--config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default tracing filter; `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Gas given to `keel run` when `--gas` is absent
    #[serde(default = "default_gas")]
    pub gas: u64,
    /// Chain, block environment and gas schedule
    #[serde(default)]
    pub executor: ExecutorConfig,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

fn default_gas() -> u64 {
    1_000_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            gas: default_gas(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl Config {
    /// `~/.keel/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".keel").join("config.toml"))
    }

    /// Load `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Write to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CliError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.gas, 1_000_000);
        assert_eq!(config.executor.chain_id, 1);
    }

    #[test]
    fn test_config_partial() {
        let toml = r#"
            gas = 50000

            [executor]
            chain_id = 5
            timestamp = 1700000000
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.gas, 50_000);
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.executor.chain_id, 5);
        assert_eq!(config.executor.timestamp, 1_700_000_000);
        assert_eq!(config.executor.block_gas_limit, 10_000_000);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.executor.chain_id = 42;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "gas = \"lots\"").unwrap();
        assert!(matches!(Config::load(&path), Err(CliError::Config(_))));
    }
}
