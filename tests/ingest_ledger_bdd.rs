//! Behavioural tests for ingesting pull requests into the ledger.

mod support;

#[path = "ingest_ledger_bdd/given.rs"]
mod ingest_ledger_bdd_given;
#[path = "ingest_ledger_bdd/state.rs"]
mod ingest_ledger_bdd_state;
#[path = "ingest_ledger_bdd/then.rs"]
mod ingest_ledger_bdd_then;
#[path = "ingest_ledger_bdd/when.rs"]
mod ingest_ledger_bdd_when;

use rstest::fixture;
use rstest_bdd_macros::scenario;

use ingest_ledger_bdd_state::LedgerState;

#[fixture]
fn ledger_state() -> LedgerState {
    LedgerState::default()
}

#[scenario(path = "tests/features/ingest_ledger.feature", index = 0)]
fn recent_pull_requests_are_paced(ledger_state: LedgerState) {
    let _ = ledger_state;
}

#[scenario(path = "tests/features/ingest_ledger.feature", index = 1)]
fn rerun_leaves_ledger_unchanged(ledger_state: LedgerState) {
    let _ = ledger_state;
}

#[scenario(path = "tests/features/ingest_ledger.feature", index = 2)]
fn failed_diff_keeps_pull_request(ledger_state: LedgerState) {
    let _ = ledger_state;
}

#[scenario(path = "tests/features/ingest_ledger.feature", index = 3)]
fn deleted_comments_are_removed(ledger_state: LedgerState) {
    let _ = ledger_state;
}

#[scenario(path = "tests/features/ingest_ledger.feature", index = 4)]
fn repositories_are_ingested_side_by_side(ledger_state: LedgerState) {
    let _ = ledger_state;
}
