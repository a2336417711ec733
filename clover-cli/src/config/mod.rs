use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use clover_consensus::{ConsensusParams, Network};
use clover_hash::{DagParams, EpochCacheManager, RetentionPolicy};

/// Contents of the TOML config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloverConfig {
    #[serde(default)]
    pub network: Network,

    /// DAG overrides; missing fields keep their mainnet value
    pub dag: Option<DagParams>,

    /// Full replacement for the network's consensus parameters
    pub consensus: Option<ConsensusParams>,

    #[serde(default)]
    pub retention: RetentionPolicy,
}

/// Config resolved against network defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub network: Network,
    pub dag: DagParams,
    pub consensus: ConsensusParams,
    pub retention: RetentionPolicy,
}

impl CloverConfig {
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn resolve(self) -> Result<Settings> {
        let dag = self.dag.unwrap_or_default();
        dag.validate().context("Invalid [dag] section")?;

        let consensus = self.consensus.unwrap_or_else(|| self.network.params());
        consensus.validate().context("Invalid [consensus] section")?;

        Ok(Settings {
            network: self.network,
            consensus,
            dag,
            retention: self.retention,
        })
    }
}

impl Settings {
    /// Fresh manager for this process
    pub fn manager(&self) -> EpochCacheManager {
        EpochCacheManager::with_retention(self.dag, self.retention)
    }
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clover")
        .join("config.toml")
}

/// Read the config at `path`, or the default location when none is given.
///
/// A missing default file means "use built-in defaults"; a missing file that
/// was asked for explicitly is an error.
pub fn load_config(path: Option<&Path>) -> Result<CloverConfig> {
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (default_config_path(), false),
    };

    if !path.exists() {
        if explicit {
            anyhow::bail!("Configuration file not found at {}", path.display());
        }
        return Ok(CloverConfig::default());
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    CloverConfig::parse(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write `config` to `path`, creating parent directories
pub fn save_config(config: &CloverConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_mainnet() {
        let settings = CloverConfig::parse("").unwrap().resolve().unwrap();
        assert_eq!(settings.network, Network::Mainnet);
        assert_eq!(settings.dag, DagParams::mainnet());
        assert_eq!(settings.consensus, ConsensusParams::mainnet());
        assert_eq!(settings.retention, RetentionPolicy::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = CloverConfig::parse(
            r#"
            network = "regtest"

            [dag]
            epoch_length = 4
            cache_bytes_init = 4096
            cache_bytes_growth = 512
            dataset_bytes_init = 65536
            dataset_bytes_growth = 4096

            [retention]
            dataset_epochs = 3
            "#,
        )
        .unwrap();
        let settings = config.resolve().unwrap();

        assert_eq!(settings.consensus, ConsensusParams::regtest());
        assert_eq!(settings.dag, DagParams::testing());
        assert_eq!(settings.retention.dataset_epochs, 3);
        assert_eq!(settings.retention.cache_epochs, 2);
    }

    #[test]
    fn test_invalid_dag_rejected() {
        let config = CloverConfig::parse("[dag]\nepoch_length = 0\n").unwrap();
        assert!(config.resolve().is_err());
        assert!(CloverConfig::parse("network = \"moonnet\"").is_err());
        assert!(CloverConfig::parse("pool = \"x\"").is_err());
    }

    #[test]
    fn test_invalid_consensus_rejected() {
        let mut consensus = ConsensusParams::mainnet();
        consensus.pow_target_timespan_v2 = 0;
        consensus.memory_hard_switch_height = 0;
        let config = CloverConfig {
            consensus: Some(consensus),
            ..CloverConfig::default()
        };
        let err = config.resolve().unwrap_err();
        assert!(format!("{:#}", err).contains("pow_target_timespan_v2"));

        let config = CloverConfig {
            network: Network::Testnet,
            consensus: Some(ConsensusParams {
                pow_target_spacing: -5,
                ..ConsensusParams::testnet()
            }),
            ..CloverConfig::default()
        };
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = CloverConfig {
            network: Network::Testnet,
            dag: Some(DagParams::testing()),
            consensus: None,
            retention: RetentionPolicy {
                cache_epochs: 4,
                dataset_epochs: 2,
            },
        };

        save_config(&config, &path).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), config);
    }
}
