//! prledger CLI entrypoint.

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use prledger::{IntakeError, PrLedgerConfig};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<(), IntakeError> {
    let config = load_config()?;
    config.validate()?;

    cli::connectivity::wait_for_database(&config).await?;
    cli::migrations::run(&config)?;
    if config.migrate_db {
        return Ok(());
    }
    if config.export {
        return cli::export::run(&config).map(drop);
    }

    cli::ingest::run(&config).await.map(drop)
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`IntakeError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<PrLedgerConfig, IntakeError> {
    PrLedgerConfig::load().map_err(|error| IntakeError::Configuration {
        message: error.to_string(),
    })
}
