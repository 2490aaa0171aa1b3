use anyhow::Result;
use bottle_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize logging from configuration, letting an explicit level win
pub fn init_logging_from_config(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<()> {
    let level = level_override
        .map(str::to_string)
        .unwrap_or_else(|| config.level.to_string());
    init_simple_tracing(&level)
}

/// Initialize simple tracing for console output on stderr
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}
