//! Assembly of pull request aggregates for one repository.
//!
//! The aggregator pages through the pull request listing, newest update
//! first, and for every pull request inside the lookback window issues the
//! dependent fetches (detail, files, diff, comments, reviews). A dependent
//! fetch that fails leaves its field at the zero value and is logged; only a
//! failure of the listing itself is returned to the caller.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::github::error::IntakeError;
use crate::github::gateway::PullRequestSource;
use crate::github::governor::RateGovernor;
use crate::github::locator::RepositoryLocator;
use crate::github::models::{PullRequestAggregate, PullRequestSummary};
use crate::github::pagination::{FIRST_PAGE, PartialPages, collect_all_pages};

/// Limits applied while collecting one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Pull requests last updated more than this many days ago are skipped.
    pub lookback_days: u32,
    /// Hard ceiling on aggregates collected per repository.
    pub max_pull_requests: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            max_pull_requests: 50,
        }
    }
}

/// Builds [`PullRequestAggregate`]s from a [`PullRequestSource`], routing
/// every request through the shared [`RateGovernor`].
pub struct PullRequestAggregator {
    source: Arc<dyn PullRequestSource>,
    governor: Arc<RateGovernor>,
    settings: AggregatorSettings,
    clock: Arc<dyn Clock>,
}

/// Keeps whatever a paginated fetch gathered, logging any failure.
///
/// Returns the items and whether the collection is incomplete.
fn settle<T>(
    outcome: Result<Vec<T>, PartialPages<T>>,
    resource: &str,
    repository: &RepositoryLocator,
    number: u64,
) -> (Vec<T>, bool) {
    match outcome {
        Ok(items) => (items, false),
        Err(PartialPages { items, error }) => {
            warn!(
                repository = %repository,
                pr = number,
                resource,
                kept = items.len(),
                %error,
                "fetch failed; keeping partial results"
            );
            (items, true)
        }
    }
}

impl PullRequestAggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(
        source: Arc<dyn PullRequestSource>,
        governor: Arc<RateGovernor>,
        settings: AggregatorSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            governor,
            settings,
            clock,
        }
    }

    /// Settings in effect.
    #[must_use]
    pub const fn settings(&self) -> AggregatorSettings {
        self.settings
    }

    fn cutoff(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        now.checked_sub_signed(Duration::days(i64::from(self.settings.lookback_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Collects up to `max_pull_requests` aggregates updated inside the
    /// lookback window, in upstream order.
    ///
    /// # Errors
    ///
    /// Returns the [`IntakeError`] from a failed listing request. Failures of
    /// dependent fetches never surface here.
    pub async fn collect(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<PullRequestAggregate>, IntakeError> {
        let cap = self.settings.max_pull_requests;
        let cutoff = self.cutoff();
        let mut aggregates = Vec::new();
        let mut cursor = Some(FIRST_PAGE);

        while let Some(page) = cursor {
            if aggregates.len() >= cap {
                break;
            }

            let listing = self
                .governor
                .call(|| self.source.list_pull_requests(repository, page))
                .await?;
            if listing.body.is_empty() {
                break;
            }

            for summary in listing.body {
                if summary.updated_at < cutoff {
                    debug!(
                        repository = %repository,
                        pr = summary.number,
                        updated_at = %summary.updated_at,
                        "outside lookback window; skipping"
                    );
                    continue;
                }
                aggregates.push(self.assemble(repository, summary).await);
                if aggregates.len() >= cap {
                    break;
                }
            }

            cursor = listing.next_page.filter(|next| *next > page);
        }

        info!(
            repository = %repository,
            collected = aggregates.len(),
            "pull requests collected"
        );
        Ok(aggregates)
    }

    /// Builds one aggregate, tolerating failure of every dependent fetch.
    pub async fn assemble(
        &self,
        repository: &RepositoryLocator,
        summary: PullRequestSummary,
    ) -> PullRequestAggregate {
        let number = summary.number;
        debug!(repository = %repository, pr = number, "assembling pull request");
        let mut aggregate =
            PullRequestAggregate::from_summary(repository, summary, self.clock.now());

        self.fill_stats(repository, &mut aggregate).await;
        self.fill_diff(repository, &mut aggregate).await;
        self.fill_comments(repository, &mut aggregate).await;
        self.fill_reviews(repository, &mut aggregate).await;

        aggregate
    }

    async fn fill_stats(&self, repository: &RepositoryLocator, aggregate: &mut PullRequestAggregate) {
        let number = aggregate.number;
        let detail = self
            .governor
            .call(|| self.source.pull_request(repository, number))
            .await;

        let files = collect_all_pages(&self.governor, |page| {
            self.source.list_files(repository, number, page)
        })
        .await;
        let (patches, truncated) = settle(files, "files", repository, number);

        match detail {
            Ok(response) => {
                let detail = response.body;
                aggregate.stats.additions = detail.additions;
                aggregate.stats.deletions = detail.deletions;
                aggregate.stats.commit_count = detail.commits;
                if detail.mergeable_state.is_some() {
                    aggregate.mergeable_state = detail.mergeable_state;
                }
            }
            Err(error) => {
                warn!(repository = %repository, pr = number, %error, "detail fetch failed");
            }
        }

        // Always the file listing's count, never the detail's `changed_files`.
        aggregate.stats.files_changed = u64::try_from(patches.len()).unwrap_or(u64::MAX);
        aggregate.patches = patches;
        aggregate.truncated.patches = truncated;
    }

    async fn fill_diff(&self, repository: &RepositoryLocator, aggregate: &mut PullRequestAggregate) {
        let number = aggregate.number;
        match self
            .governor
            .call(|| self.source.raw_diff(repository, number))
            .await
        {
            Ok(response) => aggregate.diff = response.body,
            Err(error) => {
                warn!(repository = %repository, pr = number, %error, "diff fetch failed");
            }
        }
    }

    async fn fill_comments(
        &self,
        repository: &RepositoryLocator,
        aggregate: &mut PullRequestAggregate,
    ) {
        let number = aggregate.number;
        let inline = collect_all_pages(&self.governor, |page| {
            self.source.list_review_comments(repository, number, page)
        })
        .await;
        let (mut comments, inline_truncated) =
            settle(inline, "review comments", repository, number);

        let general = collect_all_pages(&self.governor, |page| {
            self.source.list_issue_comments(repository, number, page)
        })
        .await;
        let (issue_comments, general_truncated) =
            settle(general, "issue comments", repository, number);

        comments.extend(issue_comments);
        aggregate.comments = comments;
        aggregate.truncated.comments = inline_truncated || general_truncated;
    }

    async fn fill_reviews(
        &self,
        repository: &RepositoryLocator,
        aggregate: &mut PullRequestAggregate,
    ) {
        let number = aggregate.number;
        let reviews = collect_all_pages(&self.governor, |page| {
            self.source.list_reviews(repository, number, page)
        })
        .await;
        let (reviews, truncated) = settle(reviews, "reviews", repository, number);
        aggregate.reviews = reviews;
        aggregate.truncated.reviews = truncated;
    }
}
