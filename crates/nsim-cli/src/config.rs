//! Optional TOML configuration layered under command-line flags

use std::path::{Path, PathBuf};

use anyhow::Context;
use nsim_runtime::NervePolicy;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Settings that may come from a config file
///
/// Every field is optional; a flag given on the command line wins over
/// the file, and the file wins over the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Number of worker threads
    pub workers: Option<usize>,

    /// Base RNG seed
    pub seed: Option<u64>,

    /// Seconds per tick
    pub tick_length: Option<u64>,

    /// Nerve update policy
    pub nerve_policy: Option<NervePolicy>,

    /// Report destination
    pub output: Option<PathBuf>,

    /// Pause between the final drains, in milliseconds
    pub quiescence_ms: Option<u64>,

    /// Default logging level
    pub log_level: Option<String>,
}

impl CliConfig {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration text
    pub fn from_toml(content: &str) -> CliResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = CliConfig::from_toml(
            r#"
            workers = 4
            seed = 99
            tick_length = 1
            nerve_policy = "owner-only"
            output = "out/report.txt"
            quiescence_ms = 10
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.workers, Some(4));
        assert_eq!(config.nerve_policy, Some(NervePolicy::OwnerOnly));
        assert_eq!(config.output, Some(PathBuf::from("out/report.txt")));
        assert_eq!(config.quiescence_ms, Some(10));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(CliConfig::from_toml("").unwrap(), CliConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = CliConfig::from_toml("ranks = 3").unwrap_err();
        assert!(matches!(err, CliError::Serde(_)));
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nsim.toml");
        let config = CliConfig {
            workers: Some(2),
            nerve_policy: Some(NervePolicy::AllWorkers),
            ..Default::default()
        };
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();
        assert_eq!(CliConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = CliConfig::load_from_file(Path::new("/no/such/nsim.toml")).unwrap_err();
        assert!(matches!(err, CliError::Generic(_)));
        assert!(err.to_string().contains("/no/such/nsim.toml"));
    }
}
