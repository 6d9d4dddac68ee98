//! Upstream access to pull request resources.
//!
//! [`PullRequestSource`] is the seam between ingestion and GitHub: every
//! method issues exactly one HTTP request and reports the next-page cursor
//! and rate-limit headers alongside the decoded body. Callers route each
//! call through the rate governor; the source itself never waits.

mod client;
mod error_mapping;
mod http_utils;
mod octocrab_source;

pub use octocrab_source::OctocrabPullRequestSource;

use async_trait::async_trait;

use crate::github::error::IntakeError;
use crate::github::locator::RepositoryLocator;
use crate::github::models::{
    FilePatch, PullRequestComment, PullRequestDetail, PullRequestReview, PullRequestSummary,
};
use crate::github::rate_limit::RateLimitInfo;

/// A decoded response plus the headers ingestion cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// Decoded response body.
    pub body: T,
    /// Page number advertised by the `Link: rel="next"` header.
    pub next_page: Option<u32>,
    /// Rate limit headers, when the response carried them.
    pub rate_limit: Option<RateLimitInfo>,
}

impl<T> ApiResponse<T> {
    /// Wraps `body` with no pagination or rate limit metadata.
    #[must_use]
    pub const fn new(body: T) -> Self {
        Self {
            body,
            next_page: None,
            rate_limit: None,
        }
    }

    /// Sets the next-page cursor.
    #[must_use]
    pub const fn with_next_page(mut self, next_page: Option<u32>) -> Self {
        self.next_page = next_page;
        self
    }

    /// Sets the observed rate limit.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit: Option<RateLimitInfo>) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}

/// One page of a listing endpoint.
pub type Page<T> = ApiResponse<Vec<T>>;

/// Read access to the pull request endpoints of a GitHub host.
///
/// Page numbers are 1-based.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Lists pull requests in every state, most recently updated first.
    async fn list_pull_requests(
        &self,
        repository: &RepositoryLocator,
        page: u32,
    ) -> Result<Page<PullRequestSummary>, IntakeError>;

    /// Fetches the detail record carrying size counters and mergeability.
    async fn pull_request(
        &self,
        repository: &RepositoryLocator,
        number: u64,
    ) -> Result<ApiResponse<PullRequestDetail>, IntakeError>;

    /// Lists the files changed by a pull request.
    async fn list_files(
        &self,
        repository: &RepositoryLocator,
        number: u64,
        page: u32,
    ) -> Result<Page<FilePatch>, IntakeError>;

    /// Fetches the full unified diff.
    async fn raw_diff(
        &self,
        repository: &RepositoryLocator,
        number: u64,
    ) -> Result<ApiResponse<String>, IntakeError>;

    /// Lists inline review comments.
    async fn list_review_comments(
        &self,
        repository: &RepositoryLocator,
        number: u64,
        page: u32,
    ) -> Result<Page<PullRequestComment>, IntakeError>;

    /// Lists issue-level comments.
    async fn list_issue_comments(
        &self,
        repository: &RepositoryLocator,
        number: u64,
        page: u32,
    ) -> Result<Page<PullRequestComment>, IntakeError>;

    /// Lists submitted and pending reviews.
    async fn list_reviews(
        &self,
        repository: &RepositoryLocator,
        number: u64,
        page: u32,
    ) -> Result<Page<PullRequestReview>, IntakeError>;
}
