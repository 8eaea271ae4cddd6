//! Per-route minimum-interval throttle
//!
//! The check of the last accepted timestamp and its update happen under one
//! lock, so two concurrent requests can never both pass within one window.
//! Rejected requests leave the timestamp untouched.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Last accepted request time per route
#[derive(Debug, Default)]
pub struct Throttle {
    last_accepted: Mutex<HashMap<String, Instant>>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept or reject a request on `route` arriving at `now`
    pub fn try_acquire_at(&self, route: &str, window: Duration, now: Instant) -> Result<()> {
        if window.is_zero() {
            return Ok(());
        }

        let mut last_accepted = self.last_accepted.lock();
        if let Some(&last) = last_accepted.get(route) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < window {
                return Err(Error::RateLimitExceeded {
                    route: route.to_string(),
                    retry_after: window - elapsed,
                });
            }
        }
        last_accepted.insert(route.to_string(), now);
        Ok(())
    }

    pub fn try_acquire(&self, route: &str, window: Duration) -> Result<()> {
        self.try_acquire_at(route, window, Instant::now())
    }

    /// Forget all timestamps
    pub fn reset(&self) {
        self.last_accepted.lock().clear();
    }
}
