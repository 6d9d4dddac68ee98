//! Errors that end the processing of a single repository.

use thiserror::Error;

use crate::github::IntakeError;
use crate::persistence::PersistenceError;

/// Why a repository could not be ingested.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    /// The pull request listing could not be fetched.
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// The batch could not be written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The blocking persistence task panicked or was cancelled.
    #[error("persistence task failed: {message}")]
    Worker {
        /// Join error detail.
        message: String,
    },
}
