//! Startup stages run by the binary, in order:
//!
//! - [`connectivity`]: wait for the database with the configured retry policy
//! - [`migrations`]: apply pending schema migrations
//! - [`ingest`]: dispatch every configured repository through the pipeline,
//!   or [`export`] the stored ledger instead

pub mod connectivity;
pub mod export;
pub mod ingest;
pub mod migrations;

use prledger::{IntakeError, PersistenceError, PrLedgerConfig};

/// Returns the database URL, mapped into the binary's error type.
fn database_url(config: &PrLedgerConfig) -> Result<&str, IntakeError> {
    config
        .require_database_url()
        .map_err(|error: PersistenceError| IntakeError::from_persistence("database", &error))
}
