//! In-memory rate limiting keyed by source address.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<String, VecDeque<Instant>>`.
//! Three independent limiter instances are enforced:
//! - WebSocket connection attempts
//! - Generic HTTP requests (room endpoints)
//! - AI-generation endpoints (expensive, externally billed)
//!
//! TRADE-OFFS
//! ==========
//! `is_rate_limited` records the attempt even when it is blocked, so a
//! client hammering the server keeps itself limited. Buckets for addresses
//! that stop sending events entirely are emptied by a periodic full-table
//! prune so the maps stay bounded.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::env_parse;

const DEFAULT_WS_LIMIT: usize = 30;
const DEFAULT_WS_WINDOW_SECS: u64 = 60;

const DEFAULT_HTTP_LIMIT: usize = 100;
const DEFAULT_HTTP_WINDOW_SECS: u64 = 60;

const DEFAULT_AI_LIMIT: usize = 1;
const DEFAULT_AI_WINDOW_SECS: u64 = 5;

// =============================================================================
// RATE LIMITER
// =============================================================================

/// A single sliding-window limiter: at most `max_events` events per key per
/// `window`.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_events: usize,
}

impl RateLimiter {
    #[must_use]
    pub fn new(window: Duration, max_events: usize) -> Self {
        Self { buckets: Arc::new(Mutex::new(HashMap::new())), window, max_events }
    }

    /// Record an event for `key` and report whether the key is now over its
    /// limit. Exactly `max_events` events inside one window pass; the next
    /// one is blocked until the window slides past the oldest event.
    pub fn is_rate_limited(&self, key: &str) -> bool {
        self.is_rate_limited_at(key, Instant::now())
    }

    /// Internal: check + record with an explicit timestamp (for testing).
    fn is_rate_limited_at(&self, key: &str, now: Instant) -> bool {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let bucket = buckets.entry(key.to_owned()).or_default();
        prune_window(bucket, now, self.window);
        bucket.push_back(now);
        bucket.len() > self.max_events
    }

    /// Drop expired timestamps from every bucket and remove empty buckets.
    /// Bounds memory for addresses that stopped sending events entirely.
    pub fn prune_all(&self) {
        self.prune_all_at(Instant::now());
    }

    fn prune_all_at(&self, now: Instant) {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        buckets.retain(|_, bucket| {
            prune_window(bucket, now, self.window);
            !bucket.is_empty()
        });
    }

    /// Number of tracked keys. Exposed for the prune tests.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

// =============================================================================
// LIMITER SET
// =============================================================================

/// The three limiter instances, each with its own window and ceiling.
#[derive(Clone)]
pub struct RateLimiters {
    /// WebSocket connection attempts.
    pub ws: RateLimiter,
    /// Generic HTTP requests (room endpoints).
    pub http: RateLimiter,
    /// AI-generation endpoints.
    pub ai: RateLimiter,
}

impl RateLimiters {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            ws: RateLimiter::new(
                Duration::from_secs(env_parse("RATE_LIMIT_WS_WINDOW_SECS", DEFAULT_WS_WINDOW_SECS)),
                env_parse("RATE_LIMIT_WS", DEFAULT_WS_LIMIT),
            ),
            http: RateLimiter::new(
                Duration::from_secs(env_parse(
                    "RATE_LIMIT_HTTP_WINDOW_SECS",
                    DEFAULT_HTTP_WINDOW_SECS,
                )),
                env_parse("RATE_LIMIT_HTTP", DEFAULT_HTTP_LIMIT),
            ),
            ai: RateLimiter::new(
                Duration::from_secs(env_parse("RATE_LIMIT_AI_WINDOW_SECS", DEFAULT_AI_WINDOW_SECS)),
                env_parse("RATE_LIMIT_AI", DEFAULT_AI_LIMIT),
            ),
        }
    }

    /// Spawn one prune task per limiter on the shared sweep cadence.
    pub fn spawn_prune_tasks(&self, interval: Duration) {
        for limiter in [self.ws.clone(), self.http.clone(), self.ai.clone()] {
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    limiter.prune_all();
                }
            });
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(bucket: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = bucket.front() {
        if now.duration_since(front) > window {
            bucket.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
