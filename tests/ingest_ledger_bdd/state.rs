//! Scenario state for ledger ingestion behavioural tests.

use std::num::NonZeroU32;
use std::time::Duration;

use prledger::{DispatchSummary, LedgerEntry};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use wiremock::MockServer;

pub(crate) use crate::support::github_api::ServedRepository;
pub(crate) use crate::support::ledger::Ledger;
pub(crate) use crate::support::runtime::{SharedRuntime, ensure_runtime_and_server};

#[derive(ScenarioState, Default)]
pub(crate) struct LedgerState {
    pub(crate) runtime: Slot<SharedRuntime>,
    pub(crate) server: Slot<MockServer>,
    pub(crate) ledger: Slot<Ledger>,
    pub(crate) served: Slot<Vec<ServedRepository>>,
    pub(crate) quota: Slot<NonZeroU32>,
    pub(crate) workers: Slot<usize>,
    pub(crate) summary: Slot<DispatchSummary>,
    pub(crate) elapsed: Slot<Duration>,
    pub(crate) first_run: Slot<Vec<LedgerEntry>>,
}
