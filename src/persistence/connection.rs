//! Connection setup shared by the migrator and the store.

use diesel::connection::SimpleConnection;
use diesel::Connection;
use diesel::sqlite::SqliteConnection;

use super::PersistenceError;

/// Milliseconds a writer waits for a competing write lock before failing.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Opens `database_url` with foreign keys enforced and a busy timeout set.
///
/// # Errors
///
/// Returns [`PersistenceError::BlankDatabaseUrl`] for a blank URL,
/// [`PersistenceError::ConnectionFailed`] when `SQLite` cannot open it, and
/// [`PersistenceError::ForeignKeysEnableFailed`] when a pragma fails.
pub fn open_connection(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    let trimmed = database_url.trim();
    if trimmed.is_empty() {
        return Err(PersistenceError::BlankDatabaseUrl);
    }

    let mut connection = SqliteConnection::establish(trimmed).map_err(|error| {
        PersistenceError::ConnectionFailed {
            message: error.to_string(),
        }
    })?;

    connection
        .batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        ))
        .map_err(|error| PersistenceError::ForeignKeysEnableFailed {
            message: error.to_string(),
        })?;

    Ok(connection)
}

/// Opens `database_url` and runs a trivial query.
///
/// # Errors
///
/// Returns the [`PersistenceError`] from [`open_connection`] or
/// [`PersistenceError::QueryFailed`] when the `SELECT 1` check fails.
pub fn check_connectivity(database_url: &str) -> Result<(), PersistenceError> {
    let mut connection = open_connection(database_url)?;
    connection
        .batch_execute("SELECT 1;")
        .map_err(|error| PersistenceError::QueryFailed {
            message: error.to_string(),
        })
}
