use crate::error::{ImbalanceError, Result as ImbalanceResult};
use crate::strategy::signals::classifier::validate_threshold;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analyzer: AnalyzerConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// What the loop does when the data source fails a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Skip the tick and retry on the next one
    #[default]
    Skip,
    /// Stop the loop on the first failure
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Levels summed per side
    pub levels: usize,
    /// Signal threshold in (0, 1]
    pub threshold: f64,
    pub history_capacity: usize,
    pub tick_interval_ms: u64,
    pub failure_policy: FailurePolicy,
    /// Stop after this many consecutive failures under `Skip`; unlimited if unset
    pub max_consecutive_failures: Option<u32>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            levels: 5,
            threshold: 0.6,
            history_capacity: 100,
            tick_interval_ms: 500,
            failure_policy: FailurePolicy::Skip,
            max_consecutive_failures: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> ImbalanceResult<()> {
        if self.levels == 0 {
            return Err(ImbalanceError::invalid("levels must be positive"));
        }
        validate_threshold(self.threshold)?;
        if self.history_capacity == 0 {
            return Err(ImbalanceError::invalid("history_capacity must be positive"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ImbalanceError::invalid("tick_interval_ms must be positive"));
        }
        if self.max_consecutive_failures == Some(0) {
            return Err(ImbalanceError::invalid(
                "max_consecutive_failures must be positive when set",
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Consecutive failures after which the loop stops, if any
    pub fn failure_limit(&self) -> Option<u32> {
        match self.failure_policy {
            FailurePolicy::Terminate => Some(1),
            FailurePolicy::Skip => self.max_consecutive_failures,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    #[default]
    Simulated,
    Replay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub kind: FeedKind,
    /// Seed for the simulated feed; random if unset
    pub seed: Option<u64>,
    /// Levels generated per side by the simulated feed
    pub depth: usize,
    /// Probability of a simulated outage per tick
    pub failure_rate: f64,
    /// JSON-lines file read by the replay feed
    pub replay_path: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            kind: FeedKind::Simulated,
            seed: None,
            depth: 10,
            failure_rate: 0.0,
            replay_path: None,
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> ImbalanceResult<()> {
        if self.failure_rate.is_nan() || !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ImbalanceError::invalid("failure_rate must be within [0, 1]"));
        }
        if self.kind == FeedKind::Replay && self.replay_path.is_none() {
            return Err(ImbalanceError::invalid("replay feed requires replay_path"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub output: String,
    /// Log file; empty logs to stdout
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "pretty".to_string(),
            file_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `CONFIG_FILE`, else the default path, else built-in defaults
    pub fn load() -> Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ImbalanceResult<()> {
        self.analyzer.validate()?;
        self.feed.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.analyzer.levels, 5);
        assert_eq!(config.analyzer.threshold, 0.6);
        assert_eq!(config.analyzer.history_capacity, 100);
        assert_eq!(config.analyzer.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.analyzer.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.analyzer.failure_limit(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [analyzer]
            levels = 10
            failure_policy = "terminate"

            [feed]
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.analyzer.levels, 10);
        assert_eq!(config.analyzer.threshold, 0.6);
        assert_eq!(config.analyzer.failure_limit(), Some(1));
        assert_eq!(config.feed.seed, Some(42));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_values_fail_fast() {
        for toml in [
            "[analyzer]\nlevels = 0",
            "[analyzer]\nthreshold = 0.0",
            "[analyzer]\nthreshold = 1.5",
            "[analyzer]\nhistory_capacity = 0",
            "[analyzer]\ntick_interval_ms = 0",
            "[analyzer]\nmax_consecutive_failures = 0",
            "[feed]\nfailure_rate = 2.0",
            "[feed]\nkind = \"replay\"",
        ] {
            assert!(Config::from_toml(toml).is_err(), "accepted: {}", toml);
        }
    }

    #[test]
    fn test_skip_policy_with_limit() {
        let analyzer = AnalyzerConfig {
            max_consecutive_failures: Some(3),
            ..AnalyzerConfig::default()
        };
        assert_eq!(analyzer.failure_limit(), Some(3));
    }

    #[test]
    fn test_shipped_default_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = Config::from_file(path).unwrap();
        assert_eq!(config, Config::default());
    }
}
