//! Database migration stage.

use prledger::persistence::migrate_database;
use prledger::telemetry::StderrJsonlTelemetrySink;
use prledger::{IntakeError, PrLedgerConfig};

use super::database_url;

/// Applies pending migrations, recording the schema version as telemetry.
///
/// # Errors
///
/// Returns [`IntakeError::Configuration`] if the database URL is missing or
/// blank, and [`IntakeError::Io`] for connection or migration failures.
pub fn run(config: &PrLedgerConfig) -> Result<(), IntakeError> {
    let url = database_url(config)?;
    migrate_database(url, &StderrJsonlTelemetrySink)
        .map(drop)
        .map_err(|error| IntakeError::from_persistence("migrations", &error))
}
