//! Circuit breaker guarding secret store fetches
//!
//! State is derived lazily from `(failure_count, last_failure_at, now)`;
//! there is no timer. The breaker is open while
//! `failure_count >= threshold` and the cool-down since the last failure
//! has not elapsed. The first `is_open` call after the cool-down resets the
//! count, which lets exactly one probe through to the store.

use crate::metrics;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Default number of consecutive failures before the breaker opens
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Default time the breaker stays open after the last failure
pub const DEFAULT_COOL_DOWN: Duration = Duration::from_secs(30);

/// Observable breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStatus {
    Closed,
    Open,
    /// Threshold reached but the cool-down has elapsed; the next
    /// `is_open` call resets the breaker
    CoolDownElapsed,
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_at: Option<Instant>,
}

impl BreakerState {
    fn status(&self, threshold: u32, cool_down: Duration, now: Instant) -> BreakerStatus {
        if self.failure_count < threshold {
            return BreakerStatus::Closed;
        }
        match self.last_failure_at {
            Some(last) if now.saturating_duration_since(last) < cool_down => BreakerStatus::Open,
            _ => BreakerStatus::CoolDownElapsed,
        }
    }
}

/// Consecutive-failure circuit breaker
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    cool_down: Duration,
    state: RwLock<BreakerState>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_COOL_DOWN)
    }
}

impl CircuitBreaker {
    /// Create a closed breaker
    pub fn new(threshold: u32, cool_down: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cool_down,
            state: RwLock::new(BreakerState::default()),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn cool_down(&self) -> Duration {
        self.cool_down
    }

    /// Check whether store calls should be short-circuited right now
    pub fn is_open(&self) -> bool {
        self.is_open_at(Instant::now())
    }

    /// Check whether the breaker is open at `now`
    ///
    /// Closing after the cool-down happens here, under the write lock, and
    /// only after re-checking the condition: a failure recorded between the
    /// read and the write re-stamps `last_failure_at` and keeps it open.
    pub fn is_open_at(&self, now: Instant) -> bool {
        {
            let state = self.state.read();
            match state.status(self.threshold, self.cool_down, now) {
                BreakerStatus::Closed => return false,
                BreakerStatus::Open => return true,
                BreakerStatus::CoolDownElapsed => {}
            }
        }

        let mut state = self.state.write();
        match state.status(self.threshold, self.cool_down, now) {
            BreakerStatus::CoolDownElapsed => {
                state.failure_count = 0;
                info!(
                    cool_down_secs = self.cool_down.as_secs_f64(),
                    "Circuit breaker reset after cool-down"
                );
                metrics::record_breaker_transition("closed");
                false
            }
            BreakerStatus::Open => true,
            BreakerStatus::Closed => false,
        }
    }

    /// Current status without side effects
    pub fn status_at(&self, now: Instant) -> BreakerStatus {
        self.state.read().status(self.threshold, self.cool_down, now)
    }

    /// Record a failed fetch
    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    /// Record a failed fetch at `now`
    ///
    /// The open transition is logged once, when the threshold is crossed.
    pub fn record_failure_at(&self, now: Instant) {
        let mut state = self.state.write();
        let was_open = state.failure_count >= self.threshold;
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure_at = Some(now);

        if !was_open && state.failure_count >= self.threshold {
            warn!(
                failures = state.failure_count,
                cool_down_secs = self.cool_down.as_secs_f64(),
                "Circuit breaker opened"
            );
            metrics::record_breaker_transition("open");
        }
    }

    /// Close the breaker after a successful fetch
    pub fn reset(&self) {
        let mut state = self.state.write();
        if state.failure_count > 0 {
            info!(
                failures = state.failure_count,
                "Circuit breaker closed after successful fetch"
            );
            if state.failure_count >= self.threshold {
                metrics::record_breaker_transition("closed");
            }
        }
        state.failure_count = 0;
    }

    /// Consecutive failures recorded since the last reset
    pub fn failure_count(&self) -> u32 {
        self.state.read().failure_count
    }
}
