//! Unit tests for configuration loading and resolution.
//!
//! - `helpers`: shared layer composition
//! - `precedence`: layer precedence and defaults
//! - `resolution`: repository, token and database URL resolution
//! - `validation`: numeric setting checks

mod helpers;
