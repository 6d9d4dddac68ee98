//! `SQLite` persistence and database migrations.
//!
//! Aggregates are written and read back through [`PullRequestStore`]; the
//! schema is managed with embedded Diesel migrations so the database can be
//! created and upgraded consistently across machines.

mod connection;
mod error;
mod migrator;
mod pull_request_store;

pub use connection::{BUSY_TIMEOUT_MS, check_connectivity};
pub use error::PersistenceError;
pub use migrator::{
    CURRENT_SCHEMA_VERSION, INITIAL_SCHEMA_VERSION, SchemaVersion, migrate_database,
};
pub use pull_request_store::{
    LedgerComment, LedgerEntry, LedgerPatch, LedgerPullRequest, LedgerReview, PullRequestStore,
    StoreReport,
};
