//! Startup database connectivity check.

use prledger::persistence::check_connectivity;
use prledger::retry::RetryPolicy;
use prledger::{IntakeError, PersistenceError, PrLedgerConfig};
use tracing::info;

use super::database_url;

/// Waits until the configured database accepts a connection.
///
/// # Errors
///
/// Returns [`IntakeError::Configuration`] when the database URL or retry
/// settings are invalid and [`IntakeError::Io`] when every attempt failed.
pub async fn wait_for_database(config: &PrLedgerConfig) -> Result<(), IntakeError> {
    let url = database_url(config)?;
    let policy = config.connect_retry_policy()?;
    check_with_policy(url, &policy)
        .await
        .map_err(|error| IntakeError::from_persistence("database connectivity", &error))?;
    info!(attempts = policy.attempts(), "database reachable");
    Ok(())
}

/// Checks `database_url` on the blocking pool, retrying per `policy`.
///
/// # Errors
///
/// Returns [`PersistenceError::ConnectivityExhausted`] carrying the final
/// attempt's failure.
pub async fn check_with_policy(
    database_url: &str,
    policy: &RetryPolicy,
) -> Result<(), PersistenceError> {
    policy
        .run("database connectivity check", |_attempt| {
            let url = database_url.to_owned();
            async move {
                tokio::task::spawn_blocking(move || check_connectivity(&url))
                    .await
                    .unwrap_or_else(|join_error| {
                        Err(PersistenceError::ConnectionFailed {
                            message: join_error.to_string(),
                        })
                    })
            }
        })
        .await
        .map_err(|exhausted| PersistenceError::ConnectivityExhausted {
            attempts: exhausted.attempts,
            message: exhausted.last_error.to_string(),
        })
}
