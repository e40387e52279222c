//! Fixed-window request limiter keyed by client, backed by a sharded map.
//! The only shared mutable state in the process.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::{CHAT_RATE_LIMIT, CHAT_RATE_WINDOW_SECS};

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    window_start: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, WindowCounter>,
    limit: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(CHAT_RATE_LIMIT, Duration::from_secs(CHAT_RATE_WINDOW_SECS))
    }
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { windows: DashMap::new(), limit, window }
    }

    /// Record one request for `key`. Returns false once the key has used
    /// up its budget for the current window.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert(WindowCounter { window_start: now, count: 0 });
        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }
        if entry.count >= self.limit {
            return false;
        }
        entry.count += 1;
        true
    }

    /// Drop counters whose window has fully elapsed. Called opportunistically
    /// from the request path; there is no background task.
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, c| now.duration_since(c.window_start) < self.window);
    }
}
