//! Application settings, read from a JSON file.

use crate::network_config::Network;
use crate::tracker::TrackerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable naming a config file when none is passed explicitly
pub const CONFIG_PATH_ENV: &str = "TONJETTON_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: Network,
    pub tracker: TrackerConfig,
}

impl AppConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Reads `path`, else the file named by `TONJETTON_CONFIG`, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_path(path);
        }
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_path(Path::new(&path)),
            Err(_) => {
                log::debug!("no config file given, using defaults");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "network": "testnet", "tracker": { "settle_blocks": 0 } }"#)
                .unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.tracker.settle_blocks, 0);
        assert_eq!(config.tracker.max_attempts, 100);
    }

    #[test]
    fn test_from_path() {
        let path = std::env::temp_dir().join(format!("tonjetton-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "tracker": { "poll_interval_ms": 250 } }"#).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.tracker.poll_interval_ms, 250);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AppConfig::from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            AppConfig::from_path(&path),
            Err(ConfigError::Io { .. })
        ));
    }
}
