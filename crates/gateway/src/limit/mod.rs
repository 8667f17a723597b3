//! Admission control.
//!
//! Two interchangeable strategies behind one contract, selected at
//! configuration time and never combined:
//!
//! - `TokenBucket`: an in-process continuous-refill counter with a single
//!   global key; used when no shared store is available.
//! - `FixedWindowLimiter`: a per-identity, per-minute counter in a shared
//!   Redis store; survives multiple gateway replicas.

pub mod fixed_window;
pub mod token_bucket;

pub use fixed_window::{FixedWindowLimiter, RedisCounter, WindowCounter};
pub use token_bucket::TokenBucket;

use askgate_core::config::LimitConfig;
use askgate_core::AppResult;
use std::sync::Arc;

/// Trait for admission-control strategies.
#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    /// Decide whether a request from `identity` is admitted.
    ///
    /// `Ok(false)` is the normal rejection path (budget exhausted, or the
    /// configured fail-closed policy after a store failure).
    async fn admit(&self, identity: &str) -> AppResult<bool>;
}

/// Build the limiter selected by configuration.
///
/// A configured Redis URL selects the shared fixed-window strategy;
/// otherwise the local token bucket is used.
pub async fn create_limiter(config: &LimitConfig) -> AppResult<Arc<dyn RateLimiter>> {
    match &config.redis_url {
        Some(url) => {
            tracing::info!(
                ceiling = config.per_minute,
                fail_open = config.fail_open,
                "Using shared fixed-window rate limiter"
            );
            let counter = RedisCounter::connect(url).await?;
            Ok(Arc::new(FixedWindowLimiter::new(
                Arc::new(counter),
                config.per_minute,
                config.fail_open,
            )))
        }
        None => {
            tracing::info!(
                rate_per_sec = config.rate_per_sec,
                "Using local token-bucket rate limiter"
            );
            Ok(Arc::new(TokenBucket::new(config.rate_per_sec)))
        }
    }
}
