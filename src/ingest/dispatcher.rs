//! Bounded worker pool that processes repositories in parallel.
//!
//! Every repository is queued up front and the queue is closed; `concurrency`
//! Tokio tasks then drain it, each handling one repository end-to-end before
//! taking the next. A failed repository is logged and recorded in the
//! summary without affecting its siblings.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::error::IngestError;
use crate::github::locator::RepositoryLocator;

/// Totals for one successfully processed repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryReport {
    /// Aggregates collected from GitHub.
    pub collected: usize,
    /// Pull request numbers committed.
    pub stored: Vec<u64>,
    /// Pull request numbers rolled back.
    pub failed: Vec<u64>,
}

/// Work performed for each queued repository.
#[async_trait]
pub trait RepositoryProcessor: Send + Sync {
    /// Processes one repository end-to-end.
    async fn process(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<RepositoryReport, IngestError>;
}

/// Result of processing one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOutcome {
    /// The repository.
    pub repository: RepositoryLocator,
    /// Its report, or why it was abandoned.
    pub result: Result<RepositoryReport, IngestError>,
}

/// Outcomes of a whole dispatch, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// One entry per repository that a worker picked up.
    pub outcomes: Vec<RepositoryOutcome>,
}

impl DispatchSummary {
    /// Repositories that completed.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .count()
    }

    /// Repositories that were abandoned.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

type SharedQueue = Arc<Mutex<mpsc::Receiver<RepositoryLocator>>>;

/// Fixed-size pool of repository workers.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    concurrency: NonZeroUsize,
}

impl Dispatcher {
    /// Creates a dispatcher running at most `concurrency` workers.
    #[must_use]
    pub const fn new(concurrency: NonZeroUsize) -> Self {
        Self { concurrency }
    }

    /// Processes every repository and waits for all workers to finish.
    pub async fn run(
        &self,
        processor: Arc<dyn RepositoryProcessor>,
        repositories: Vec<RepositoryLocator>,
    ) -> DispatchSummary {
        let queued = repositories.len();
        let workers = self.concurrency.get().min(queued);
        let (sender, receiver) = mpsc::channel(queued.max(1));
        for repository in repositories {
            if sender.send(repository).await.is_err() {
                break;
            }
        }
        drop(sender);

        info!(repositories = queued, workers, "dispatching repositories");

        let queue: SharedQueue = Arc::new(Mutex::new(receiver));
        let mut pool = JoinSet::new();
        for worker in 0..workers {
            pool.spawn(run_worker(
                worker,
                Arc::clone(&queue),
                Arc::clone(&processor),
            ));
        }

        let mut summary = DispatchSummary::default();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(outcomes) => summary.outcomes.extend(outcomes),
                Err(join_error) => error!(%join_error, "worker task aborted"),
            }
        }

        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "dispatch complete"
        );
        summary
    }
}

async fn run_worker(
    worker: usize,
    queue: SharedQueue,
    processor: Arc<dyn RepositoryProcessor>,
) -> Vec<RepositoryOutcome> {
    let mut outcomes = Vec::new();
    loop {
        let next = queue.lock().await.recv().await;
        let Some(repository) = next else {
            break;
        };

        info!(worker, repository = %repository, "processing repository");
        let result = processor.process(&repository).await;
        match &result {
            Ok(report) => info!(
                worker,
                repository = %repository,
                collected = report.collected,
                stored = report.stored.len(),
                failed = report.failed.len(),
                "repository complete"
            ),
            Err(error) => warn!(
                worker,
                repository = %repository,
                %error,
                "repository abandoned"
            ),
        }
        outcomes.push(RepositoryOutcome { repository, result });
    }
    outcomes
}
