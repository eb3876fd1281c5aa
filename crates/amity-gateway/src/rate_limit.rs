//! Per-user fixed-window rate limiting for friend requests.
//!
//! Constructed once by the composition root and shared through
//! [`AppState`](crate::handlers::AppState); there is no global instance, so
//! every test and every server gets its own counters.
//!
//! Memory stays bounded: expired windows are swept every
//! [`CLEANUP_INTERVAL`] checks, and at most `max_tracked_users` windows are
//! held. A user not yet tracked is turned away while the table is full of
//! live windows.

use crate::config::RateLimitConfig;
use amity_domain::UserId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Expired windows are swept once every this many checks
pub const CLEANUP_INTERVAL: u64 = 100;

/// Tracked-user cap used by [`RateLimiter::new`]
pub const DEFAULT_MAX_TRACKED_USERS: usize = 10_000;

/// Limit reached for the current window
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Rate limit exceeded, retry in {}s", .retry_after.as_secs().max(1))]
pub struct RateLimitExceeded {
    /// Time until the caller's window resets
    pub retry_after: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter keyed by user
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    max_tracked_users: usize,
    windows: Mutex<HashMap<UserId, Window>>,
    checks: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window` per user
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            max_tracked_users: DEFAULT_MAX_TRACKED_USERS,
            windows: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    /// Hold at most `max` user windows at once
    pub fn with_max_tracked_users(mut self, max: usize) -> Self {
        self.max_tracked_users = max.max(1);
        self
    }

    /// Create a limiter from configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
            .with_max_tracked_users(config.max_tracked_users)
    }

    /// Count one request for `user`, failing once the window is full
    pub fn check(&self, user: &UserId) -> Result<(), RateLimitExceeded> {
        self.check_at(user, Instant::now())
    }

    fn check_at(&self, user: &UserId, now: Instant) -> Result<(), RateLimitExceeded> {
        // Counters stay meaningful even if another thread panicked mid-update
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let checks = self.checks.fetch_add(1, Ordering::Relaxed);
        if checks > 0 && checks % CLEANUP_INTERVAL == 0 {
            self.prune(&mut windows, now);
        }

        if !windows.contains_key(user) && windows.len() >= self.max_tracked_users {
            self.prune(&mut windows, now);
            if windows.len() >= self.max_tracked_users {
                // Room opens when the oldest live window expires
                let retry_after = windows
                    .values()
                    .map(|w| self.window.saturating_sub(now.duration_since(w.started)))
                    .min()
                    .unwrap_or(self.window);
                tracing::warn!(
                    "Rejecting {}: {} users already tracked",
                    user,
                    windows.len()
                );
                return Err(RateLimitExceeded { retry_after });
            }
        }

        let entry = windows.entry(user.clone()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let retry_after = self.window.saturating_sub(now.duration_since(entry.started));
            tracing::debug!("Rate limit hit for {} ({} requests)", user, entry.count);
            return Err(RateLimitExceeded { retry_after });
        }

        entry.count += 1;
        Ok(())
    }

    fn prune(&self, windows: &mut HashMap<UserId, Window>, now: Instant) {
        let before = windows.len();
        let window = self.window;
        windows.retain(|_, w| now.duration_since(w.started) < window);
        tracing::debug!("Pruned {} expired rate-limit windows", before - windows.len());
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
