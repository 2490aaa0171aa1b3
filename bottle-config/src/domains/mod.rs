//! Domain-specific configuration modules

pub mod breaker;
pub mod corpus;
pub mod http;
pub mod logging;
pub mod report;
pub mod workload;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Tunables of the load generator, combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BottleConfig {
    /// Phase sizes and drain behaviour
    #[serde(default)]
    pub workload: workload::WorkloadConfig,

    /// Latency circuit breaker
    #[serde(default)]
    pub breaker: breaker::BreakerConfig,

    /// HTTP client and connection pool
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Seed corpus location
    #[serde(default)]
    pub corpus: corpus::CorpusConfig,

    /// Report output
    #[serde(default)]
    pub report: report::ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl BottleConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.workload.validate()?;
        self.breaker.validate()?;
        self.http.validate()?;
        self.corpus.validate()?;
        self.report.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = BottleConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
