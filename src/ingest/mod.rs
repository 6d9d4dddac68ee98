//! Repository ingestion: aggregation, persistence and the worker pool that
//! drives both.

pub mod aggregator;
pub mod dispatcher;
pub mod error;
pub mod pipeline;

pub use aggregator::{AggregatorSettings, PullRequestAggregator};
pub use dispatcher::{
    DispatchSummary, Dispatcher, RepositoryOutcome, RepositoryProcessor, RepositoryReport,
};
pub use error::IngestError;
pub use pipeline::RepositoryPipeline;
