//! Shared helpers for the ledger integration tests.

pub mod github_api;
pub mod ledger;
pub mod runtime;
