//! Wall-clock access for components that compare against upstream timestamps.
//!
//! Rate-limit reset instants and the lookback cutoff are both expressed in
//! wall-clock time, so they cannot use Tokio's monotonic clock. Injecting a
//! [`Clock`] keeps those comparisons deterministic under test.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current instant as whole seconds since the Unix epoch.
    ///
    /// Instants before the epoch are reported as 0.
    fn now_unix_seconds(&self) -> u64 {
        u64::try_from(self.now().timestamp()).unwrap_or(0)
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Creates a clock that always reports `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Creates a clock frozen at `seconds` after the Unix epoch.
    ///
    /// Out-of-range values fall back to the epoch itself.
    #[must_use]
    pub fn at_unix_seconds(seconds: i64) -> Self {
        Self(DateTime::from_timestamp(seconds, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
