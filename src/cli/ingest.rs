//! Ingest stage: wires the governor, source, aggregator, store and
//! dispatcher together and processes every configured repository.

use std::sync::Arc;

use prledger::clock::SystemClock;
use prledger::github::PullRequestSource;
use prledger::telemetry::{StderrJsonlTelemetrySink, TelemetrySink};
use prledger::{
    DispatchSummary, Dispatcher, IntakeError, OctocrabPullRequestSource, PersonalAccessToken,
    PrLedgerConfig, PullRequestAggregator, PullRequestStore, RateGovernor, RepositoryLocator,
    RepositoryPipeline,
};
use tracing::{info, warn};

use super::database_url;

/// Ingests every configured repository using the Octocrab-backed source.
///
/// # Errors
///
/// Returns an [`IntakeError`] for configuration problems discovered before
/// dispatch. Failures of individual repositories are logged and reported in
/// the returned summary instead.
pub async fn run(config: &PrLedgerConfig) -> Result<DispatchSummary, IntakeError> {
    let repositories = config.resolve_repositories()?;
    let token = PersonalAccessToken::new(config.resolve_token()?)?;
    let api_base = repositories
        .first()
        .map(RepositoryLocator::api_base)
        .ok_or(IntakeError::MissingRepositories)?;
    let source = OctocrabPullRequestSource::for_token(&token, api_base)?;

    run_with_source(
        config,
        repositories,
        Arc::new(source),
        Arc::new(StderrJsonlTelemetrySink),
    )
    .await
}

/// Ingests `repositories` from an arbitrary source.
///
/// # Errors
///
/// Returns an [`IntakeError`] when the database URL or a numeric setting is
/// invalid.
pub async fn run_with_source(
    config: &PrLedgerConfig,
    repositories: Vec<RepositoryLocator>,
    source: Arc<dyn PullRequestSource>,
    telemetry: Arc<dyn TelemetrySink>,
) -> Result<DispatchSummary, IntakeError> {
    let store = PullRequestStore::new(database_url(config)?)
        .map_err(|error| IntakeError::from_persistence("store", &error))?;
    let governor = Arc::new(RateGovernor::new(config.rate_limit_per_hour()?));
    info!(
        repositories = repositories.len(),
        interval = ?governor.interval(),
        "starting ingest"
    );

    let aggregator = PullRequestAggregator::new(
        source,
        governor,
        config.aggregator_settings(),
        Arc::new(SystemClock),
    );
    let pipeline = Arc::new(RepositoryPipeline::new(aggregator, store, telemetry));
    let summary = Dispatcher::new(config.concurrency()?)
        .run(pipeline, repositories)
        .await;

    for outcome in &summary.outcomes {
        if let Err(error) = &outcome.result {
            warn!(repository = %outcome.repository, %error, "repository not ingested");
        }
    }
    Ok(summary)
}
