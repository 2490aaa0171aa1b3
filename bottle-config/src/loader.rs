//! Configuration loading and environment variable handling

use crate::domains::BottleConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "BOTTLE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<BottleConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: BottleConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<BottleConfig> {
        let mut config = BottleConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<BottleConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut BottleConfig) -> ConfigResult<()> {
        if let Some(max_failures) = self.parse_env_var::<u32>("MAX_FAILURES")? {
            config.breaker.max_failures = max_failures;
        }
        if let Some(ms) = self.parse_env_var::<u64>("LATENCY_THRESHOLD_MS")? {
            config.breaker.latency_threshold = Duration::from_millis(ms);
        }
        if let Some(ms) = self.parse_env_var::<u64>("COOLDOWN_MS")? {
            config.breaker.cooldown = Duration::from_millis(ms);
        }

        if let Some(requests) = self.parse_env_var::<usize>("REQUESTS_PER_THREAD")? {
            config.workload.requests_per_thread = requests;
        }

        if let Some(attempts) = self.parse_env_var::<u32>("MAX_ATTEMPTS")? {
            config.http.max_attempts = attempts;
        }

        if let Ok(path) = self.get_env_var("CORPUS_PATH") {
            config.corpus.path = path.into();
        }
        if let Ok(dir) = self.get_env_var("RESULTS_DIR") {
            config.report.results_dir = dir.into();
        }

        if let Ok(level) = self.get_env_var("LOG_LEVEL") {
            config.logging.level = level.parse()?;
        }

        Ok(())
    }

    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| {
                    ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e))
                }),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
