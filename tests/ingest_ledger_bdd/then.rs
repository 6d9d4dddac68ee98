//! Then steps for ledger ingestion behavioural tests.

use std::time::Duration;

use rstest_bdd_macros::then;

use crate::ingest_ledger_bdd_state::{Ledger, LedgerState};
use crate::support::github_api::diff_for;

fn with_ledger<T>(ledger_state: &LedgerState, read: impl FnOnce(&Ledger) -> T) -> T {
    ledger_state
        .ledger
        .with_ref(read)
        .unwrap_or_else(|| panic!("ledger not initialised"))
}

fn elapsed(ledger_state: &LedgerState) -> Duration {
    ledger_state
        .elapsed
        .get()
        .unwrap_or_else(|| panic!("ingestion has not run"))
}

fn numbers(list: &str) -> Vec<i64> {
    list.trim_matches('"')
        .split(',')
        .map(|number| {
            number
                .trim()
                .parse()
                .unwrap_or_else(|error| panic!("'{number}' is not a number: {error}"))
        })
        .collect()
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or_else(|error| panic!("{value} does not fit i64: {error}"))
}

#[then("every repository is ingested successfully")]
fn every_repository_succeeded(ledger_state: &LedgerState) {
    let summary = ledger_state
        .summary
        .get()
        .unwrap_or_else(|| panic!("ingestion has not run"));
    let served = ledger_state.served.get().unwrap_or_default();

    assert_eq!(summary.failed(), 0, "abandoned repositories: {summary:?}");
    assert_eq!(summary.succeeded(), served.len());
}

#[then("repository {name} has pull requests {list} in persistence order")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
fn persistence_order(ledger_state: &LedgerState, name: String, list: String) {
    let name = name.trim_matches('"');
    let order = with_ledger(ledger_state, |ledger| ledger.persisted_order(name));

    assert_eq!(order, numbers(&list), "write order of {name}");
}

#[then("the ledger holds {comments:u64} comments, {reviews:u64} reviews and {patches:u64} patches")]
fn ledger_totals(ledger_state: &LedgerState, comments: u64, reviews: u64, patches: u64) {
    let counts = with_ledger(ledger_state, |ledger| {
        [
            ledger.count("pr_comments"),
            ledger.count("pr_reviews"),
            ledger.count("pr_patches"),
        ]
    });

    assert_eq!(counts, [signed(comments), signed(reviews), signed(patches)]);
}

#[then("the run took at least {seconds:u64} seconds")]
fn took_at_least(ledger_state: &LedgerState, seconds: u64) {
    let elapsed = elapsed(ledger_state);

    assert!(
        elapsed >= Duration::from_secs(seconds),
        "requests were not paced: {elapsed:?}"
    );
}

#[then("the run took less than {seconds:u64} seconds")]
fn took_less_than(ledger_state: &LedgerState, seconds: u64) {
    let elapsed = elapsed(ledger_state);

    assert!(
        elapsed < Duration::from_secs(seconds),
        "repositories were not processed side by side: {elapsed:?}"
    );
}

#[then("the ledger is unchanged by the second run")]
fn ledger_unchanged(ledger_state: &LedgerState) {
    let first = ledger_state
        .first_run
        .get()
        .unwrap_or_else(|| panic!("no first run recorded"));
    let second = with_ledger(ledger_state, Ledger::snapshot);

    assert!(!first.is_empty(), "the first run stored nothing");
    assert_eq!(first, second);
}

#[then("pull request {number:u64} of repository {name} is stored with its diff")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
fn stored_with_diff(ledger_state: &LedgerState, number: u64, name: String) {
    let diff = with_ledger(ledger_state, |ledger| {
        ledger.diff(name.trim_matches('"'), signed(number))
    });

    assert_eq!(diff, diff_for(number));
}

#[then("pull request {number:u64} of repository {name} is stored without a diff")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
fn stored_without_diff(ledger_state: &LedgerState, number: u64, name: String) {
    let diff = with_ledger(ledger_state, |ledger| {
        ledger.diff(name.trim_matches('"'), signed(number))
    });

    assert!(diff.is_empty(), "unexpected diff: {diff}");
}

#[then("pull request {number:u64} of repository {name} has {count:u64} stored comments")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
fn stored_comments(ledger_state: &LedgerState, number: u64, name: String, count: u64) {
    let stored = with_ledger(ledger_state, |ledger| {
        ledger.comment_count(name.trim_matches('"'), signed(number))
    });

    assert_eq!(stored, signed(count));
}
