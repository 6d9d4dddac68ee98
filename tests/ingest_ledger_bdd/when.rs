//! When steps for ledger ingestion behavioural tests.

use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::Arc;
use std::time::Instant;

use prledger::clock::FixedClock;
use prledger::telemetry::NoopTelemetrySink;
use prledger::{
    AggregatorSettings, Dispatcher, OctocrabPullRequestSource, PersonalAccessToken,
    PullRequestAggregator, PullRequestStore, RateGovernor, RepositoryLocator, RepositoryPipeline,
};
use rstest_bdd_macros::when;
use wiremock::MockServer;

use crate::ingest_ledger_bdd_given::remount;
use crate::ingest_ledger_bdd_state::{Ledger, LedgerState};
use crate::support::github_api::{OWNER, now};

#[when("ingestion runs with concurrency {workers:u64}")]
fn ingestion_runs(ledger_state: &LedgerState, workers: u64) {
    let workers = usize::try_from(workers)
        .unwrap_or_else(|error| panic!("worker count {workers}: {error}"));
    ledger_state.workers.set(workers);
    run_ingestion(ledger_state);
}

#[when("the same window is ingested again")]
fn ingested_again(ledger_state: &LedgerState) {
    let snapshot = ledger_state
        .ledger
        .with_ref(Ledger::snapshot)
        .unwrap_or_else(|| panic!("ledger not initialised"));
    ledger_state.first_run.set(snapshot);
    run_ingestion(ledger_state);
}

#[when("the issue comments of pull request {number:u64} in repository {name} are deleted upstream")]
#[expect(
    clippy::expect_used,
    reason = "integration test step; allow-expect-in-tests does not cover integration tests"
)]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
fn issue_comments_deleted(ledger_state: &LedgerState, number: u64, name: String) {
    let name = name.trim_matches('"');
    let runtime = ledger_state.runtime.get().expect("runtime not initialised");
    let mut served = ledger_state.served.take().expect("no repositories served");
    served
        .iter_mut()
        .filter(|repository| repository.name == name)
        .for_each(|repository| repository.without_issue_comments.push(number));
    remount(ledger_state, &runtime, &served);
    ledger_state.served.set(served);
}

#[expect(
    clippy::expect_used,
    reason = "integration test step; allow-expect-in-tests does not cover integration tests"
)]
fn run_ingestion(ledger_state: &LedgerState) {
    let runtime = ledger_state.runtime.get().expect("runtime not initialised");
    let server_uri = ledger_state
        .server
        .with_ref(MockServer::uri)
        .expect("mock server not initialised");
    let served = ledger_state.served.get().expect("no repositories served");
    let database_url = ledger_state
        .ledger
        .with_ref(|ledger| ledger.url().to_owned())
        .expect("ledger not initialised");
    let quota = ledger_state.quota.get().unwrap_or(NonZeroU32::MAX);
    let workers = ledger_state
        .workers
        .get()
        .and_then(NonZeroUsize::new)
        .unwrap_or(NonZeroUsize::MIN);

    let repositories: Vec<RepositoryLocator> = served
        .iter()
        .map(|repository| {
            RepositoryLocator::parse(&format!("{server_uri}/{OWNER}/{}", repository.name))
                .expect("repository locator should parse")
        })
        .collect();
    let api_base = repositories
        .first()
        .expect("at least one repository")
        .api_base()
        .clone();

    let token = PersonalAccessToken::new("test-token").expect("token should be valid");
    let source = runtime
        .block_on(async { OctocrabPullRequestSource::for_token(&token, &api_base) })
        .expect("source should build");
    let aggregator = PullRequestAggregator::new(
        Arc::new(source),
        Arc::new(RateGovernor::new(quota)),
        AggregatorSettings {
            lookback_days: 7,
            max_pull_requests: 2,
        },
        Arc::new(FixedClock::new(now())),
    );
    let pipeline = RepositoryPipeline::new(
        aggregator,
        PullRequestStore::new(database_url).expect("store should build"),
        Arc::new(NoopTelemetrySink),
    );

    let start = Instant::now();
    let summary =
        runtime.block_on(Dispatcher::new(workers).run(Arc::new(pipeline), repositories));
    ledger_state.elapsed.set(start.elapsed());
    ledger_state.summary.set(summary);
}
