//! Process-wide pacing of GitHub requests.
//!
//! Every worker shares one [`RateGovernor`]. Admission has two stages: a
//! reactive cooldown parks callers until the advertised reset once the last
//! observed remaining budget drops below [`COOLDOWN_THRESHOLD`], then a token
//! bucket with capacity one spaces calls `3600 s / quota` apart. Tokens are
//! only handed out after the cooldown so that callers released together are
//! still spaced. The governor never fails a request; it only delays it.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::github::error::IntakeError;
use crate::github::gateway::ApiResponse;
use crate::github::rate_limit::RateLimitInfo;

/// Remaining-call count below which callers wait for the quota reset.
pub const COOLDOWN_THRESHOLD: u32 = 10;

/// Slack added to the advertised reset before resuming.
const RESET_GRACE: Duration = Duration::from_secs(1);

const SECONDS_PER_HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug, Default)]
struct RateState {
    remaining: Option<u32>,
    reset_at: u64,
}

/// Shared admission control for outbound API calls.
pub struct RateGovernor {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
    state: Mutex<RateState>,
    clock: Arc<dyn Clock>,
}

impl RateGovernor {
    /// Creates a governor admitting at most `quota_per_hour` calls per hour.
    #[must_use]
    pub fn new(quota_per_hour: NonZeroU32) -> Self {
        Self::with_clock(quota_per_hour, Arc::new(SystemClock))
    }

    /// Creates a governor that reads wall-clock time from `clock`.
    #[must_use]
    pub fn with_clock(quota_per_hour: NonZeroU32, clock: Arc<dyn Clock>) -> Self {
        let interval = SECONDS_PER_HOUR
            .checked_div(quota_per_hour.get())
            .unwrap_or(SECONDS_PER_HOUR);
        Self {
            interval,
            next_slot: Mutex::new(None),
            state: Mutex::new(RateState::default()),
            clock,
        }
    }

    /// Minimum spacing between two admissions.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until one outbound call may be issued.
    pub async fn acquire(&self) {
        self.wait_for_reset().await;
        self.wait_for_token().await;
    }

    /// Records rate limit headers from a response.
    pub async fn observe(&self, info: RateLimitInfo) {
        let mut state = self.state.lock().await;
        state.remaining = Some(info.remaining());
        state.reset_at = info.reset_at();
    }

    /// Acquires, issues `request`, and observes any rate limit metadata on
    /// the response or on a rate limit error.
    ///
    /// # Errors
    ///
    /// Returns whatever `request` returns; the governor adds no failures.
    pub async fn call<T, F, Fut>(&self, request: F) -> Result<ApiResponse<T>, IntakeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ApiResponse<T>, IntakeError>>,
    {
        self.acquire().await;
        let result = request().await;
        let observed = match &result {
            Ok(response) => response.rate_limit,
            Err(error) => error.rate_limit(),
        };
        if let Some(info) = observed {
            self.observe(info).await;
        }
        result
    }

    async fn wait_for_token(&self) {
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next_slot.map_or(now, |scheduled| scheduled.max(now));
            *next_slot = Some(slot + self.interval);
            slot
        };
        sleep_until(slot).await;
    }

    async fn wait_for_reset(&self) {
        let mut state = self.state.lock().await;
        let Some(remaining) = state.remaining else {
            return;
        };
        if remaining >= COOLDOWN_THRESHOLD {
            return;
        }

        let now = self.clock.now_unix_seconds();
        if now >= state.reset_at {
            return;
        }

        let wait = Duration::from_secs(state.reset_at - now) + RESET_GRACE;
        warn!(
            remaining,
            reset_at = state.reset_at,
            wait_seconds = wait.as_secs(),
            "rate limit nearly exhausted; pausing until reset"
        );
        sleep(wait).await;
        state.remaining = None;
        debug!("rate limit window reset; resuming");
    }
}
