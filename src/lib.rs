//! prledger library crate: ingests GitHub pull request activity into a
//! local `SQLite` ledger.
//!
//! Repositories are processed by a bounded worker pool. Every GitHub request
//! passes through one shared [`RateGovernor`] so that the whole run stays
//! under the configured hourly quota, and each pull request is written in
//! its own transaction so that re-running over the same window is safe. The
//! stored ledger can be exported again as JSON Lines.

pub mod clock;
pub mod config;
pub mod export;
pub mod github;
pub mod ingest;
pub mod persistence;
pub mod retry;
pub mod telemetry;

pub use config::PrLedgerConfig;
pub use github::{
    IntakeError, OctocrabPullRequestSource, PersonalAccessToken, PullRequestAggregate,
    PullRequestSource, RateGovernor, RepositoryLocator,
};
pub use ingest::{
    AggregatorSettings, DispatchSummary, Dispatcher, IngestError, PullRequestAggregator,
    RepositoryPipeline,
};
pub use export::write_jsonl;
pub use persistence::{LedgerEntry, PersistenceError, PullRequestStore};
