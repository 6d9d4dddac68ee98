//! Maps transport failures and non-success responses into `IntakeError`.

use http::StatusCode;

use crate::github::error::IntakeError;
use crate::github::rate_limit::RateLimitInfo;

/// Checks if a GitHub error status indicates an authentication failure.
const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// A 403 or 429 is a rate limit rejection when GitHub says so in the body or
/// the headers report no remaining budget.
fn is_rate_limit_response(
    status: StatusCode,
    message: &str,
    rate_limit: Option<&RateLimitInfo>,
) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && (message.to_lowercase().contains("rate limit")
            || rate_limit.is_some_and(RateLimitInfo::is_exhausted))
}

/// Maps a failure raised by Octocrab before any response was available.
pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> IntakeError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return map_http_error(operation, source.status_code, Some(source.message.clone()), None);
    }

    if is_network_error(error) {
        return IntakeError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    IntakeError::api(format!("{operation} failed: {error}"))
}

/// Maps a non-success HTTP response, keeping its rate limit headers on
/// whichever error it becomes.
pub(super) fn map_http_error(
    operation: &str,
    status: StatusCode,
    maybe_message: Option<String>,
    rate_limit: Option<RateLimitInfo>,
) -> IntakeError {
    let message = maybe_message.unwrap_or_else(|| "unknown error".to_owned());

    if is_rate_limit_response(status, &message, rate_limit.as_ref()) {
        let base = format!("{operation} failed: {message}");
        let message = match &rate_limit {
            Some(info) => format!("{base} (resets at {reset})", reset = info.reset_at()),
            None => base,
        };
        return IntakeError::RateLimitExceeded {
            rate_limit,
            message,
        };
    }

    if is_auth_failure(status) {
        IntakeError::Authentication {
            message: format!("{operation} failed: GitHub returned {status} {message}"),
            rate_limit,
        }
    } else {
        IntakeError::Api {
            message: format!("{operation} failed with status {status}: {message}"),
            rate_limit,
        }
    }
}
