use anyhow::{Context, Result};
use bottle_config::{BottleConfig, ConfigLoader};
use bottle_load::{LoadTest, LoadTestError};
use bottle_logging::init_logging_from_config;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

mod cli;
use cli::Cli;

/// Load configuration from file or environment, then apply CLI path flags
fn load_config(cli: &Cli) -> Result<BottleConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::new()
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => ConfigLoader::new()
            .from_env()
            .context("Failed to load configuration from environment")?,
    };
    cli.apply_overrides(&mut config);
    Ok(config)
}

async fn run(cli: Cli, config: BottleConfig) -> Result<(), LoadTestError> {
    let run = cli.run_config()?;
    info!(
        "Load test against {}: {} groups of {} workers, {:?} apart",
        run.base_url, run.num_thread_groups, run.thread_group_size, run.delay
    );

    let summary = LoadTest::new(run, config).run().await?;
    if summary.main.timed_out {
        info!("Load test finished with partial results");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not errors
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    if let Err(e) = init_logging_from_config(&config.logging, cli.log_level.as_deref())
        .context("Failed to initialize logging")
    {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            let code = u8::try_from(e.exit_code()).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
