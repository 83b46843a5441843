//! Per-caller sliding-window rate limiting.

use std::collections::VecDeque;
use std::time::Duration;

use indexmap::IndexMap;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default maximum number of callers to track before LRU eviction.
const DEFAULT_MAX_CALLERS: usize = 10000;

/// A sliding-window request limiter keyed per caller.
///
/// Counts requests inside a rolling window and denies requests once a
/// caller's budget is spent. A single in-process store; a distributed
/// deployment would need a shared counter store instead.
///
/// To bound memory under many unique callers, tracked callers are limited
/// and the least recently active are evicted.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    /// Map from caller id to the timestamps of their recent requests.
    /// Uses IndexMap to maintain insertion order for LRU eviction.
    callers: RwLock<IndexMap<String, VecDeque<Instant>>>,
    window: Duration,
    max_requests: usize,
    max_callers: usize,
}

impl SlidingWindowLimiter {
    /// Create a limiter with the given window and per-caller budget.
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self::with_limits(window, max_requests, DEFAULT_MAX_CALLERS)
    }

    /// Create a limiter with a custom tracked-caller cap.
    pub fn with_limits(window: Duration, max_requests: usize, max_callers: usize) -> Self {
        Self {
            callers: RwLock::new(IndexMap::new()),
            window,
            max_requests,
            max_callers,
        }
    }

    /// Record a request attempt for `caller`.
    ///
    /// Returns true when the request fits the caller's budget, false when
    /// the caller is over budget for the current window. The check and the
    /// count update happen under one lock.
    pub async fn try_acquire(&self, caller: &str) -> bool {
        let now = Instant::now();
        let mut callers = self.callers.write().await;

        // Remove and re-insert to move to end (mark as recently used)
        let mut timestamps = callers.shift_remove(caller).unwrap_or_default();

        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        let allowed = timestamps.len() < self.max_requests;
        if allowed {
            timestamps.push_back(now);
        }
        callers.insert(caller.to_string(), timestamps);

        // LRU eviction: drop the least recently active callers
        while callers.len() > self.max_callers {
            callers.shift_remove_index(0);
        }

        allowed
    }

    /// Number of currently tracked callers.
    pub async fn caller_count(&self) -> usize {
        let callers = self.callers.read().await;
        callers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_budget_enforced() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 20);

        for i in 0..20 {
            assert!(limiter.try_acquire("alice").await, "request {} denied", i);
        }
        assert!(!limiter.try_acquire("alice").await, "21st request allowed");
    }

    #[tokio::test]
    async fn test_callers_budgeted_independently() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 2);

        assert!(limiter.try_acquire("alice").await);
        assert!(limiter.try_acquire("alice").await);
        assert!(!limiter.try_acquire("alice").await);

        assert!(limiter.try_acquire("bob").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 1);

        assert!(limiter.try_acquire("alice").await);
        assert!(!limiter.try_acquire("alice").await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.try_acquire("alice").await);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let limiter = SlidingWindowLimiter::with_limits(Duration::from_secs(60), 5, 2);

        assert!(limiter.try_acquire("a").await);
        assert!(limiter.try_acquire("b").await);
        assert!(limiter.try_acquire("c").await);

        assert_eq!(limiter.caller_count().await, 2);
    }
}
