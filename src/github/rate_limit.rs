//! Rate limit information from GitHub API responses.
//!
//! This module provides the `RateLimitInfo` type for capturing rate limit
//! headers returned by the GitHub API. The rate governor feeds every observed
//! value back into its shared state so that all workers back off together.

use http::HeaderMap;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Rate limit information extracted from GitHub API response headers.
///
/// GitHub includes rate limit headers (`X-RateLimit-Limit`, `X-RateLimit-Remaining`,
/// `X-RateLimit-Reset`) in API responses. This struct captures those values for
/// inspection by callers.
///
/// # Example
///
/// ```
/// use prledger::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo::new(5000, 4999, 1700000000);
/// assert!(!info.is_exhausted());
/// assert_eq!(info.remaining(), 4999);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Maximum requests allowed in the current window.
    limit: u32,
    /// Remaining requests in the current window.
    remaining: u32,
    /// Unix timestamp when the rate limit resets.
    reset_at: u64,
}

impl RateLimitInfo {
    /// Creates a new rate limit info instance.
    #[must_use]
    pub const fn new(limit: u32, remaining: u32, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Reads the rate limit headers from a response.
    ///
    /// Returns `None` unless the remaining count and reset timestamp are both
    /// present and numeric. A missing limit header is reported as 0.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = parse_header::<u32>(headers, REMAINING_HEADER)?;
        let reset_at = parse_header::<u64>(headers, RESET_HEADER)?;
        let limit = parse_header::<u32>(headers, LIMIT_HEADER).unwrap_or(0);
        Some(Self::new(limit, remaining, reset_at))
    }

    /// Returns the maximum requests allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the remaining requests in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the Unix timestamp when the rate limit resets.
    #[must_use]
    pub const fn reset_at(&self) -> u64 {
        self.reset_at
    }

    /// Returns true if the rate limit has been exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Calculates seconds until the rate limit resets, relative to `now_unix`.
    ///
    /// Returns 0 if the reset time has already passed.
    #[must_use]
    pub const fn seconds_until_reset(&self, now_unix: u64) -> u64 {
        self.reset_at.saturating_sub(now_unix)
    }
}

fn parse_header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<T>().ok())
}
