//! Shared fixed-window rate limiter.
//!
//! Counts requests per caller identity in non-overlapping one-minute
//! windows, in a shared Redis store so every gateway replica sees the
//! same budget. The increment and the first-write TTL run in one Lua
//! script, so concurrent callers observe linearizable counts with no
//! read-modify-write race.

use super::RateLimiter;
use askgate_core::{AppError, AppResult};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Window length, in seconds. Counter keys expire with their window.
pub const WINDOW_SECS: u64 = 60;

/// Atomic INCR with a TTL set only on the first increment of a key.
const INCR_WITH_EXPIRY: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Trait over the shared counter store.
///
/// The seam exists so the limiter's policy (ceiling, window rollover,
/// store-failure handling) is testable without a live store.
#[async_trait::async_trait]
pub trait WindowCounter: Send + Sync {
    /// Atomically increment `key`, arranging for it to expire `ttl_secs`
    /// after its first increment. Returns the post-increment count.
    async fn increment(&self, key: &str, ttl_secs: u64) -> AppResult<u64>;
}

/// Redis-backed window counter.
pub struct RedisCounter {
    connection: ConnectionManager,
}

impl RedisCounter {
    /// Connect to the shared store. Connection failure at startup is a
    /// configuration problem and fails fast.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AppError::Config(format!("Invalid Redis URL: {}", e)))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Config(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection })
    }
}

#[async_trait::async_trait]
impl WindowCounter for RedisCounter {
    async fn increment(&self, key: &str, ttl_secs: u64) -> AppResult<u64> {
        let script = redis::Script::new(INCR_WITH_EXPIRY);
        let mut connection = self.connection.clone();

        let count: u64 = script
            .key(key)
            .arg(ttl_secs)
            .invoke_async(&mut connection)
            .await
            .map_err(|e| AppError::Other(format!("Rate-limit store error: {}", e)))?;

        Ok(count)
    }
}

/// Fixed-window limiter over a shared counter.
pub struct FixedWindowLimiter {
    counter: Arc<dyn WindowCounter>,
    ceiling: u32,
    fail_open: bool,
}

impl FixedWindowLimiter {
    pub fn new(counter: Arc<dyn WindowCounter>, ceiling: u32, fail_open: bool) -> Self {
        Self {
            counter,
            ceiling,
            fail_open,
        }
    }

    /// Counter key for `identity` in the window containing `unix_now`.
    fn window_key(identity: &str, unix_now: u64) -> String {
        format!("ratelimit:{}:{}", identity, unix_now / WINDOW_SECS)
    }
}

#[async_trait::async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn admit(&self, identity: &str) -> AppResult<bool> {
        let unix_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Other(format!("System clock error: {}", e)))?
            .as_secs();
        let key = Self::window_key(identity, unix_now);

        match self.counter.increment(&key, WINDOW_SECS).await {
            Ok(count) => Ok(count <= u64::from(self.ceiling)),
            Err(e) if self.fail_open => {
                tracing::warn!(error = %e, "Rate-limit store unavailable, admitting (fail-open)");
                Ok(true)
            }
            Err(e) => {
                tracing::error!(error = %e, "Rate-limit store unavailable, rejecting (fail-closed)");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stand-in for the shared store.
    struct MemoryCounter {
        counts: Mutex<HashMap<String, u64>>,
    }

    impl MemoryCounter {
        fn new() -> Self {
            Self {
                counts: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl WindowCounter for MemoryCounter {
        async fn increment(&self, key: &str, _ttl_secs: u64) -> AppResult<u64> {
            let mut counts = self.counts.lock().unwrap();
            let count = counts.entry(key.to_string()).or_insert(0);
            *count += 1;
            Ok(*count)
        }
    }

    /// A store that is always unreachable.
    struct BrokenCounter;

    #[async_trait::async_trait]
    impl WindowCounter for BrokenCounter {
        async fn increment(&self, _key: &str, _ttl_secs: u64) -> AppResult<u64> {
            Err(AppError::Other("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_ceiling_requests_admitted_then_rejected() {
        let limiter = FixedWindowLimiter::new(Arc::new(MemoryCounter::new()), 3, false);

        assert!(limiter.admit("alice").await.unwrap());
        assert!(limiter.admit("alice").await.unwrap());
        assert!(limiter.admit("alice").await.unwrap());
        assert!(!limiter.admit("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_identities_count_separately() {
        let limiter = FixedWindowLimiter::new(Arc::new(MemoryCounter::new()), 1, false);

        assert!(limiter.admit("alice").await.unwrap());
        assert!(!limiter.admit("alice").await.unwrap());
        // A different identity has its own budget
        assert!(limiter.admit("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_per_minute_ceiling_boundary() {
        // 120 requests admitted in one window; the 121st rejected
        let limiter = FixedWindowLimiter::new(Arc::new(MemoryCounter::new()), 120, false);

        for _ in 0..120 {
            assert!(limiter.admit("203.0.113.7").await.unwrap());
        }
        assert!(!limiter.admit("203.0.113.7").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_failure_fail_closed() {
        let limiter = FixedWindowLimiter::new(Arc::new(BrokenCounter), 120, false);
        assert!(!limiter.admit("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_failure_fail_open() {
        let limiter = FixedWindowLimiter::new(Arc::new(BrokenCounter), 120, true);
        assert!(limiter.admit("alice").await.unwrap());
    }

    #[test]
    fn test_window_key_rolls_over_at_minute_boundary() {
        let w0 = FixedWindowLimiter::window_key("alice", 59);
        let w1 = FixedWindowLimiter::window_key("alice", 60);
        let w1_late = FixedWindowLimiter::window_key("alice", 119);

        assert_eq!(w0, "ratelimit:alice:0");
        assert_eq!(w1, "ratelimit:alice:1");
        // Same window start, same key: the counter is shared within the window
        assert_eq!(w1, w1_late);
        assert_ne!(w0, w1);
    }

    #[tokio::test]
    async fn test_next_window_resets_the_budget() {
        // Drive the key computation directly: a fresh window means a fresh
        // key, and a fresh key starts counting from one.
        let counter = MemoryCounter::new();

        let w0_key = FixedWindowLimiter::window_key("alice", 30);
        let w1_key = FixedWindowLimiter::window_key("alice", 90);

        assert_eq!(counter.increment(&w0_key, WINDOW_SECS).await.unwrap(), 1);
        assert_eq!(counter.increment(&w0_key, WINDOW_SECS).await.unwrap(), 2);
        assert_eq!(counter.increment(&w1_key, WINDOW_SECS).await.unwrap(), 1);
    }
}
