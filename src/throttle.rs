// Request admission control — fixed window per client key.
//
// Each key owns one bucket: a request count and the instant its window
// opened. The first request after the window has elapsed replaces the
// bucket outright; a request that arrives while the bucket is full is
// rejected without touching the count.
//
// The whole check-then-mutate sequence runs under one lock and never
// awaits, so concurrent requests for the same key can't both slip past a
// full bucket. Buckets are never evicted; the map grows with the number of
// distinct clients seen during the process lifetime.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// Key shared by every caller that arrives without an identity.
/// All anonymous traffic is throttled together.
pub const FALLBACK_KEY: &str = "global";

pub const DEFAULT_WINDOW_MS: u64 = 60_000;
pub const DEFAULT_MAX_REQUESTS: u32 = 15;

/// Throttle limits. Both values are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(DEFAULT_WINDOW_MS),
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

impl ThrottleConfig {
    /// Build from raw values, substituting the default for anything zero.
    pub fn new(window_ms: u64, max_requests: u32) -> Self {
        let defaults = Self::default();
        Self {
            window: if window_ms == 0 {
                defaults.window
            } else {
                Duration::from_millis(window_ms)
            },
            max_requests: if max_requests == 0 {
                defaults.max_requests
            } else {
                max_requests
            },
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected,
}

#[derive(Debug, Clone, Copy)]
struct ThrottleBucket {
    count: u32,
    window_start: Instant,
}

/// Per-key request throttle. Owns its bucket map, so independent instances
/// never share state.
#[derive(Debug)]
pub struct RequestThrottle {
    config: ThrottleConfig,
    buckets: Mutex<HashMap<String, ThrottleBucket>>,
}

impl RequestThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> ThrottleConfig {
        self.config
    }

    /// Check and record a request for `key` at the current instant.
    pub fn admit(&self, key: &str) -> Admission {
        self.admit_at(key, Instant::now())
    }

    /// Check and record a request for `key` as if it arrived at `now`.
    pub fn admit_at(&self, key: &str, now: Instant) -> Admission {
        // A panic elsewhere while holding the lock leaves the map intact,
        // so a poisoned lock is still safe to use.
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let fresh = ThrottleBucket {
            count: 1,
            window_start: now,
        };
        match buckets.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                Admission::Allowed
            }
            Entry::Occupied(mut slot) => {
                let bucket = slot.get_mut();
                if now.saturating_duration_since(bucket.window_start) >= self.config.window {
                    *bucket = fresh;
                    Admission::Allowed
                } else if bucket.count >= self.config.max_requests {
                    debug!(key, "Throttle rejected request");
                    Admission::Rejected
                } else {
                    bucket.count += 1;
                    Admission::Allowed
                }
            }
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Resolve the throttle key for a caller, falling back to the shared key.
pub fn client_key(identity: Option<&str>) -> &str {
    match identity.map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => FALLBACK_KEY,
    }
}
