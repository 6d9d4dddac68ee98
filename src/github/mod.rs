//! GitHub access: repository identity, wire models, the upstream source
//! trait, and the shared rate governor that paces every request.
//!
//! Errors are mapped into [`IntakeError`] variants so that callers can tell
//! configuration mistakes, authentication failures, rate limiting and
//! transport trouble apart without depending on Octocrab types.

pub mod error;
pub mod gateway;
pub mod governor;
pub mod locator;
pub mod models;
pub mod pagination;
pub mod rate_limit;

pub use error::IntakeError;
pub use gateway::{ApiResponse, OctocrabPullRequestSource, Page, PullRequestSource};
pub use governor::RateGovernor;
pub use locator::{PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner};
pub use models::{
    FilePatch, PatchStatus, PullRequestAggregate, PullRequestComment, PullRequestReview,
    PullRequestState, PullRequestStats, PullRequestSummary, ReviewState,
};
pub use rate_limit::RateLimitInfo;

#[cfg(test)]
pub use gateway::MockPullRequestSource;
