//! Per-repository processing: collect, persist, report.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::aggregator::PullRequestAggregator;
use super::dispatcher::{RepositoryProcessor, RepositoryReport};
use super::error::IngestError;
use crate::github::locator::RepositoryLocator;
use crate::github::models::PullRequestAggregate;
use crate::persistence::{PullRequestStore, StoreReport};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Collects a repository's recent pull requests and writes them to the store.
pub struct RepositoryPipeline {
    aggregator: PullRequestAggregator,
    store: PullRequestStore,
    telemetry: Arc<dyn TelemetrySink>,
}

impl RepositoryPipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(
        aggregator: PullRequestAggregator,
        store: PullRequestStore,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            aggregator,
            store,
            telemetry,
        }
    }

    async fn persist(
        &self,
        aggregates: Vec<PullRequestAggregate>,
    ) -> Result<StoreReport, IngestError> {
        if aggregates.is_empty() {
            return Ok(StoreReport::default());
        }
        let store = self.store.clone();
        let joined = tokio::task::spawn_blocking(move || store.store(&aggregates)).await;
        match joined {
            Ok(result) => Ok(result?),
            Err(join_error) => Err(IngestError::Worker {
                message: join_error.to_string(),
            }),
        }
    }
}

#[async_trait]
impl RepositoryProcessor for RepositoryPipeline {
    async fn process(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<RepositoryReport, IngestError> {
        let aggregates = self.aggregator.collect(repository).await?;
        let collected = aggregates.len();
        let stored = self.persist(aggregates).await?;

        if !stored.is_complete() {
            warn!(
                repository = %repository,
                failed = ?stored.failed,
                "some pull requests were not stored"
            );
        }
        self.telemetry.record(TelemetryEvent::RepositoryIngested {
            repository: repository.full_name(),
            stored: stored.stored.len(),
            failed: stored.failed.len(),
        });
        info!(
            repository = %repository,
            collected,
            stored = stored.stored.len(),
            "repository ingested"
        );

        Ok(RepositoryReport {
            collected,
            stored: stored.stored,
            failed: stored.failed,
        })
    }
}
