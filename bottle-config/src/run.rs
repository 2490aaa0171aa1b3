//! Frozen parameters of a single load-test run

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_http_url, validate_positive, Validatable};
use std::time::Duration;

/// Default global deadline for the main phase, in minutes
pub const DEFAULT_EXECUTOR_TIMEOUT_MIN: u64 = 30;

/// Run parameters taken from the command line.
///
/// Built once by [`RunConfig::new`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Workers released per cohort
    pub thread_group_size: usize,
    /// Number of cohorts in the main phase
    pub num_thread_groups: usize,
    /// Gap between consecutive cohort releases
    pub delay: Duration,
    /// Base URL of the system under test, without a trailing slash
    pub base_url: String,
    pub use_circuit_breaker: bool,
    /// Global deadline for the main phase
    pub executor_timeout: Duration,
}

impl RunConfig {
    pub fn new(
        thread_group_size: usize,
        num_thread_groups: usize,
        delay_seconds: u64,
        base_url: impl Into<String>,
        use_circuit_breaker: bool,
        executor_timeout_min: u64,
    ) -> ConfigResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let delay_ms = delay_seconds.checked_mul(1000).ok_or_else(|| {
            ConfigError::ValidationError(format!("delay of {}s is too large", delay_seconds))
        })?;
        let timeout_secs = executor_timeout_min.checked_mul(60).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "executor timeout of {} minutes is too large",
                executor_timeout_min
            ))
        })?;

        let config = Self {
            thread_group_size,
            num_thread_groups,
            delay: Duration::from_millis(delay_ms),
            base_url,
            use_circuit_breaker,
            executor_timeout: Duration::from_secs(timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// Upper bound on main-phase attempts (two requests per iteration)
    pub fn max_main_phase_requests(&self, requests_per_thread: usize) -> usize {
        self.thread_group_size
            .saturating_mul(self.num_thread_groups)
            .saturating_mul(requests_per_thread)
            .saturating_mul(2)
    }
}

impl Validatable for RunConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.thread_group_size,
            "threadGroupSize",
            self.domain_name(),
        )?;
        validate_http_url(&self.base_url, "baseUrl", self.domain_name())?;
        validate_positive(
            self.executor_timeout.as_secs(),
            "executorTimeoutMin",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "run"
    }
}
