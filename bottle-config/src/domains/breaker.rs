//! Circuit breaker configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Latency circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Number of overlong successes before the circuit opens
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Latency above which a successful response counts as a failure
    #[serde(with = "humantime_serde", default = "default_latency_threshold")]
    pub latency_threshold: Duration,

    /// Time requests are dropped after the last overlong response
    #[serde(with = "humantime_serde", default = "default_cooldown")]
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            latency_threshold: default_latency_threshold(),
            cooldown: default_cooldown(),
        }
    }
}

impl Validatable for BreakerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_failures, "max_failures", self.domain_name())?;
        validate_positive(
            self.latency_threshold.as_millis(),
            "latency_threshold",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "breaker"
    }
}

fn default_max_failures() -> u32 {
    20
}

fn default_latency_threshold() -> Duration {
    Duration::from_millis(5000)
}

fn default_cooldown() -> Duration {
    Duration::from_millis(5000)
}
