//! HTTP issuer configuration

use bottle_config::HttpConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the shared client, pool and retry loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerConfig {
    pub max_total_connections: usize,
    pub max_per_route: usize,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub max_attempts: u32,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for IssuerConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            max_total_connections: config.max_total_connections,
            max_per_route: config.max_per_route,
            request_timeout: config.request_timeout,
            connect_timeout: config.connect_timeout,
            user_agent: config.user_agent.clone(),
            max_attempts: config.max_attempts.max(1),
        }
    }
}
