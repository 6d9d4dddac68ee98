//! Error types for persistence operations.

use thiserror::Error;

/// Errors returned while opening, migrating or writing the `SQLite` store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// No database URL/path was provided.
    #[error("database URL is required (use --database-url or PRLEDGER_DATABASE_URL)")]
    MissingDatabaseUrl,

    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Every connectivity attempt at startup failed.
    #[error("database unreachable after {attempts} attempts: {message}")]
    ConnectivityExhausted {
        /// Attempts made before giving up.
        attempts: u32,
        /// Detail from the last failed attempt.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// Applying connection pragmas failed.
    #[error("failed to configure connection: {message}")]
    ForeignKeysEnableFailed {
        /// Error detail from the PRAGMA execution.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// The store tables do not exist yet.
    #[error("database schema is not initialised (run with --migrate-db first)")]
    SchemaNotInitialised,

    /// A read query failed.
    #[error("database query failed: {message}")]
    QueryFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// A write failed.
    #[error("database write failed: {message}")]
    WriteFailed {
        /// Error detail from Diesel.
        message: String,
    },
}
