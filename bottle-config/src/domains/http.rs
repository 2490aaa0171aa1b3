//! HTTP client configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_range, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on physical attempts per logical request
pub const MAX_ATTEMPTS_LIMIT: u32 = 5;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Total connections shared by all workers
    #[serde(default = "default_max_total_connections")]
    pub max_total_connections: usize,

    /// Connections per route (scheme, host and port)
    #[serde(default = "default_max_per_route")]
    pub max_per_route: usize,

    /// Request timeout
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Connection timeout
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Physical attempts per request; 1 disables retries
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_total_connections: default_max_total_connections(),
            max_per_route: default_max_per_route(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.max_total_connections,
            "max_total_connections",
            self.domain_name(),
        )?;
        validate_positive(self.max_per_route, "max_per_route", self.domain_name())?;
        if self.max_per_route > self.max_total_connections {
            return Err(self.validation_error(format!(
                "max_per_route ({}) cannot exceed max_total_connections ({})",
                self.max_per_route, self.max_total_connections
            )));
        }

        validate_positive(
            self.request_timeout.as_millis(),
            "request_timeout",
            self.domain_name(),
        )?;
        validate_positive(
            self.connect_timeout.as_millis(),
            "connect_timeout",
            self.domain_name(),
        )?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        validate_range(
            self.max_attempts,
            1,
            MAX_ATTEMPTS_LIMIT,
            "max_attempts",
            self.domain_name(),
        )?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

// Default value functions
fn default_max_total_connections() -> usize {
    500
}

fn default_max_per_route() -> usize {
    20
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("bottle-loadtest/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_attempts() -> u32 {
    1
}
