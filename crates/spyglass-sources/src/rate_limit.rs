//! Sliding-window rate limiter for component polls
//!
//! Tracks call timestamps per component key in a bounded deque over a
//! trailing window. Prune, check, record is one sequence under a single
//! lock hold, so concurrent callers can never both take the last slot.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-key sliding-window rate limiter.
pub struct RateLimiter {
    window: Duration,
    max_calls: u32,
    calls: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Limiter allowing `max_calls` per key within any trailing `window`.
    pub fn new(window: Duration, max_calls: u32) -> Self {
        Self {
            window,
            max_calls,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt to take a call slot for `key`.
    ///
    /// Returns `false` when the key is already at its ceiling for the
    /// current window; otherwise records the call and returns `true`. A
    /// consumed slot is never released early, so callers must acquire only
    /// when a network call will actually be issued.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut calls = self.calls.lock().unwrap();
        let timestamps = calls.entry(key.to_string()).or_default();

        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() as u32 >= self.max_calls {
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Calls currently counted against `key`'s window (test observability).
    pub fn current_count(&self, key: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(key)
            .map(|t| t.len())
            .unwrap_or(0)
    }
}
