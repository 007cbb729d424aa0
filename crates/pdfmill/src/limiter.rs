//! Per-submitter sliding-window admission control.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window-log rate limiter keyed by an opaque submitter identity
/// (typically a client address).
///
/// The prune / check / append sequence for an identity happens under one
/// lock, so concurrent submissions cannot over-admit. A denied attempt
/// records no timestamp and therefore never extends the window.
pub struct RateLimiter {
    max_attempts: usize,
    window: Duration,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    /// # Panics
    /// Panics if `max_attempts` is 0 or `window` is zero.
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        assert!(max_attempts > 0, "max_attempts must be > 0");
        assert!(!window.is_zero(), "window must be non-zero");
        Self {
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the submission is admitted and records the attempt.
    pub fn admit(&self, identity: &str) -> bool {
        self.admit_at(identity, Instant::now())
    }

    fn admit_at(&self, identity: &str, now: Instant) -> bool {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());

        // Prune expired timestamps and evict identities with none left.
        attempts.retain(|_, stamps| {
            stamps.retain(|t| now.duration_since(*t) < self.window);
            !stamps.is_empty()
        });

        let stamps = attempts.entry(identity.to_string()).or_default();
        if stamps.len() >= self.max_attempts {
            return false;
        }
        stamps.push(now);
        true
    }

    /// Number of identities currently tracked (post-prune state).
    pub fn tracked_identities(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}
