//! Ledger export stage.
//!
//! Reads every stored pull request back from the database and writes it as
//! JSON Lines to the configured output file, or to standard output.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use prledger::{IntakeError, LedgerEntry, PrLedgerConfig, PullRequestStore, write_jsonl};
use tracing::info;

use super::database_url;

/// Exports the stored ledger and returns the number of pull requests written.
///
/// # Errors
///
/// Returns [`IntakeError::Configuration`] for a missing database URL or an
/// unmigrated schema, and [`IntakeError::Io`] when reading the ledger or
/// writing the output fails.
pub fn run(config: &PrLedgerConfig) -> Result<usize, IntakeError> {
    let store = PullRequestStore::new(database_url(config)?)
        .map_err(|error| IntakeError::from_persistence("export", &error))?;
    let entries = store
        .load_all()
        .map_err(|error| IntakeError::from_persistence("export", &error))?;

    write_output(config.output.as_deref(), &entries)?;
    info!(pull_requests = entries.len(), "ledger exported");
    Ok(entries.len())
}

fn write_output(output: Option<&str>, entries: &[LedgerEntry]) -> Result<(), IntakeError> {
    if let Some(path) = output {
        let file = File::create(path).map_err(|error| IntakeError::Io {
            message: format!("failed to create output file '{path}': {error}"),
        })?;
        let mut writer = BufWriter::new(file);
        write_jsonl(&mut writer, entries)?;
        writer.flush().map_err(|error| IntakeError::Io {
            message: format!("failed to flush output file: {error}"),
        })
    } else {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        write_jsonl(&mut writer, entries)
    }
}
