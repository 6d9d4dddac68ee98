//! Error types exposed by the GitHub intake layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;
use crate::persistence::PersistenceError;

/// Errors surfaced while parsing input or communicating with GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntakeError {
    /// No repositories were configured for ingestion.
    #[error("at least one repository is required (use --repositories or --owner/--repo)")]
    MissingRepositories,

    /// A configured repository entry was not of the form `owner/name`.
    #[error("repository entry `{entry}` must be of the form owner/name")]
    InvalidRepository {
        /// The offending entry.
        entry: String,
    },

    /// The provided URL could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// A repository URL or identifier is missing its owner or name.
    #[error("repository must include both an owner and a name")]
    MissingPathSegments,

    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
        /// Rate limit headers carried by the rejection, if any.
        rate_limit: Option<RateLimitInfo>,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
        /// Rate limit headers carried by the response, if any.
        rate_limit: Option<RateLimitInfo>,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// Rate limit exceeded - the API returned 403/429 with a rate limit message.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info if available from response headers.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// Invalid pagination parameters.
    #[error("invalid pagination: {message}")]
    InvalidPagination {
        /// Description of the invalid parameter.
        message: String,
    },
}

impl IntakeError {
    /// Wraps a persistence failure encountered during `operation`.
    ///
    /// Blank or missing database URLs and a missing schema are configuration
    /// problems; everything else is reported as I/O.
    #[must_use]
    pub fn from_persistence(operation: &str, error: &PersistenceError) -> Self {
        match error {
            PersistenceError::MissingDatabaseUrl
            | PersistenceError::BlankDatabaseUrl
            | PersistenceError::SchemaNotInitialised => Self::Configuration {
                message: format!("{operation}: {error}"),
            },
            _ => Self::Io {
                message: format!("{operation}: {error}"),
            },
        }
    }

    /// Builds an [`IntakeError::Api`] for a failure with no response
    /// headers to report.
    #[must_use]
    pub const fn api(message: String) -> Self {
        Self::Api {
            message,
            rate_limit: None,
        }
    }

    /// Rate limit metadata attached to the error, if any.
    ///
    /// Every error built from an HTTP response carries the headers it was
    /// sent with, so the governor can observe budgets reported on 404s and
    /// 5xx responses as well as on rejections.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<RateLimitInfo> {
        match self {
            Self::RateLimitExceeded { rate_limit, .. }
            | Self::Authentication { rate_limit, .. }
            | Self::Api { rate_limit, .. } => *rate_limit,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::IntakeError;
    use crate::github::rate_limit::RateLimitInfo;
    use crate::persistence::PersistenceError;

    #[rstest]
    #[case::blank(PersistenceError::BlankDatabaseUrl, true)]
    #[case::schema(PersistenceError::SchemaNotInitialised, true)]
    #[case::connection(
        PersistenceError::ConnectionFailed { message: "boom".to_owned() },
        false
    )]
    fn persistence_errors_map_to_configuration_or_io(
        #[case] error: PersistenceError,
        #[case] is_configuration: bool,
    ) {
        let mapped = IntakeError::from_persistence("store", &error);
        if is_configuration {
            assert!(
                matches!(mapped, IntakeError::Configuration { .. }),
                "expected Configuration, got {mapped:?}"
            );
        } else {
            assert!(
                matches!(mapped, IntakeError::Io { .. }),
                "expected Io, got {mapped:?}"
            );
        }
    }

    #[test]
    fn rate_limit_is_exposed_for_every_response_error() {
        let info = RateLimitInfo::new(5000, 2, 1_700_000_000);
        let limited = IntakeError::RateLimitExceeded {
            rate_limit: Some(info),
            message: "slow down".to_owned(),
        };
        let missing = IntakeError::Api {
            message: "not found".to_owned(),
            rate_limit: Some(info),
        };
        let rejected = IntakeError::Authentication {
            message: "bad credentials".to_owned(),
            rate_limit: Some(info),
        };
        let offline = IntakeError::Network {
            message: "connection reset".to_owned(),
        };

        assert_eq!(limited.rate_limit(), Some(info));
        assert_eq!(missing.rate_limit(), Some(info));
        assert_eq!(rejected.rate_limit(), Some(info));
        assert_eq!(offline.rate_limit(), None);
        assert_eq!(IntakeError::api("decode".to_owned()).rate_limit(), None);
    }
}
