//! Workload phase configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sizes of the warmup and main phases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Workers launched by the warmup phase
    #[serde(default = "default_warmup_threads")]
    pub warmup_threads: usize,

    /// Iterations per warmup worker
    #[serde(default = "default_warmup_requests_per_thread")]
    pub warmup_requests_per_thread: usize,

    /// Iterations per main-phase worker
    #[serde(default = "default_requests_per_thread")]
    pub requests_per_thread: usize,

    /// Grace period for in-flight requests once the run deadline passes
    #[serde(with = "humantime_serde", default = "default_drain_timeout")]
    pub drain_timeout: Duration,
}

impl WorkloadConfig {
    /// Minimum number of successful warmup records for the run to continue
    pub fn warmup_success_floor(&self) -> usize {
        self.warmup_threads.saturating_mul(self.warmup_requests_per_thread)
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            warmup_threads: default_warmup_threads(),
            warmup_requests_per_thread: default_warmup_requests_per_thread(),
            requests_per_thread: default_requests_per_thread(),
            drain_timeout: default_drain_timeout(),
        }
    }
}

impl Validatable for WorkloadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.warmup_threads, "warmup_threads", self.domain_name())?;
        validate_positive(
            self.warmup_requests_per_thread,
            "warmup_requests_per_thread",
            self.domain_name(),
        )?;
        validate_positive(
            self.requests_per_thread,
            "requests_per_thread",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "workload"
    }
}

fn default_warmup_threads() -> usize {
    10
}

fn default_warmup_requests_per_thread() -> usize {
    100
}

fn default_requests_per_thread() -> usize {
    1000
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(10)
}
