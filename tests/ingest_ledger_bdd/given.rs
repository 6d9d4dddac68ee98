//! Given steps for ledger ingestion behavioural tests.

use std::num::NonZeroU32;
use std::time::Duration;

use rstest_bdd_macros::given;

use crate::ingest_ledger_bdd_state::{
    Ledger, LedgerState, ServedRepository, SharedRuntime, ensure_runtime_and_server,
};
use crate::support::github_api::serve;

const SLOW_LISTING: Duration = Duration::from_secs(3);

/// Adds `repository` to the served set and remounts the mock API.
pub(crate) fn serve_repository(ledger_state: &LedgerState, repository: ServedRepository) {
    let runtime = ensure_runtime_and_server(&ledger_state.runtime, &ledger_state.server)
        .unwrap_or_else(|error| panic!("failed to create Tokio runtime: {error}"));

    let mut served = ledger_state.served.take().unwrap_or_default();
    served.push(repository);
    remount(ledger_state, &runtime, &served);
    ledger_state.served.set(served);
}

/// Mounts `served` on the scenario server, replacing any earlier mocks.
pub(crate) fn remount(
    ledger_state: &LedgerState,
    runtime: &SharedRuntime,
    served: &[ServedRepository],
) {
    ledger_state
        .server
        .with_ref(|server| runtime.block_on(serve(server, served)))
        .unwrap_or_else(|| panic!("mock server not initialised"));
}

#[given("a migrated ledger")]
fn migrated_ledger(ledger_state: &LedgerState) {
    ledger_state.ledger.set(Ledger::migrated());
}

#[given("a GitHub API serving repository {name}")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
fn api_serving(ledger_state: &LedgerState, name: String) {
    serve_repository(ledger_state, ServedRepository::new(name.trim_matches('"')));
}

#[given("a GitHub API failing the diff of pull request {number:u64} in repository {name}")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
fn api_failing_diff(ledger_state: &LedgerState, number: u64, name: String) {
    let repository = ServedRepository {
        failing_diff: Some(number),
        ..ServedRepository::new(name.trim_matches('"'))
    };
    serve_repository(ledger_state, repository);
}

#[given("a GitHub API slowly listing repository {name}")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
fn api_slowly_listing(ledger_state: &LedgerState, name: String) {
    let repository = ServedRepository {
        listing_delay: SLOW_LISTING,
        ..ServedRepository::new(name.trim_matches('"'))
    };
    serve_repository(ledger_state, repository);
}

#[given("a request quota of {quota:u64} per hour")]
fn request_quota(ledger_state: &LedgerState, quota: u64) {
    let quota = u32::try_from(quota)
        .ok()
        .and_then(NonZeroU32::new)
        .unwrap_or_else(|| panic!("quota {quota} must be a non-zero u32"));
    ledger_state.quota.set(quota);
}

#[given("an unlimited request quota")]
fn unlimited_quota(ledger_state: &LedgerState) {
    ledger_state.quota.set(NonZeroU32::MAX);
}
