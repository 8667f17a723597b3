//! Continuous-refill token bucket.
//!
//! Capacity accumulates at `rate` per second up to a cap of `rate`, and
//! each admitted request spends 1.0, giving a one-second burst window.
//! The bucket has a single global key: without a shared store there is
//! no per-caller distinction.

use super::RateLimiter;
use askgate_core::AppResult;
use std::sync::Mutex;
use std::time::Instant;

struct BucketState {
    allowance: f64,
    last_check: Instant,
}

/// In-process continuous-refill limiter.
pub struct TokenBucket {
    rate: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a bucket admitting `rate_per_sec` requests per second,
    /// with an equal burst cap. The bucket starts full.
    pub fn new(rate_per_sec: f64) -> Self {
        Self {
            rate: rate_per_sec,
            state: Mutex::new(BucketState {
                allowance: rate_per_sec,
                last_check: Instant::now(),
            }),
        }
    }

    /// Admission check against an explicit clock reading.
    ///
    /// The lock covers only this arithmetic; no await happens inside it.
    fn admit_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let elapsed = now.saturating_duration_since(state.last_check).as_secs_f64();
        state.last_check = now;
        state.allowance = (state.allowance + elapsed * self.rate).min(self.rate);

        if state.allowance < 1.0 {
            false
        } else {
            state.allowance -= 1.0;
            true
        }
    }
}

#[async_trait::async_trait]
impl RateLimiter for TokenBucket {
    async fn admit(&self, _identity: &str) -> AppResult<bool> {
        Ok(self.admit_at(Instant::now()))
    }
}
