//! Sliding-window rate limiter for upstream requests
//!
//! The upstream API tolerates roughly 3 requests per 10 seconds before it
//! starts blocking the client, so every outbound call shares this limiter.
//! Checking and recording are separate steps: `can_proceed` only inspects
//! the window, and the caller records the request once it actually sends
//! one. Two tasks can therefore both pass the check inside the same
//! window slot; the window is deliberately conservative enough that the
//! occasional extra request is harmless.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::debug;

const DEFAULT_MAX_REQUESTS: usize = 3;
const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Granularity at which `await_turn` re-checks the window.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<Vec<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }

    pub fn with_limits(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(Vec::new()),
        }
    }

    /// True when a request sent now would fit in the window. Does not
    /// reserve the slot.
    pub fn can_proceed(&self) -> bool {
        let mut timestamps = self.timestamps.lock().unwrap();
        let window = self.window;
        timestamps.retain(|t| t.elapsed() < window);
        timestamps.len() < self.max_requests
    }

    /// Record that a request was just sent.
    pub fn record_request(&self) {
        let mut timestamps = self.timestamps.lock().unwrap();
        timestamps.push(Instant::now());
        if timestamps.len() >= self.max_requests {
            debug!(
                "Rate limit window full ({}/{})",
                timestamps.len(),
                self.max_requests
            );
        }
    }

    /// Wait until a slot opens in the window. Polls rather than computing
    /// the exact wake-up time; the granularity is coarse enough not to
    /// matter against a 10 second window.
    pub async fn await_turn(&self) {
        loop {
            if self.can_proceed() {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_fills_and_drains() {
        let limiter = RateLimiter::with_limits(2, Duration::from_millis(80));
        assert!(limiter.can_proceed());

        limiter.record_request();
        assert!(limiter.can_proceed());
        limiter.record_request();
        assert!(!limiter.can_proceed());

        std::thread::sleep(Duration::from_millis(100));
        assert!(limiter.can_proceed());
    }

    #[test]
    fn check_does_not_reserve_the_slot() {
        let limiter = RateLimiter::with_limits(1, Duration::from_secs(10));
        assert!(limiter.can_proceed());
        // A second check still passes until someone records
        assert!(limiter.can_proceed());
        limiter.record_request();
        assert!(!limiter.can_proceed());
    }

    #[tokio::test]
    async fn await_turn_returns_once_the_window_drains() {
        let limiter = RateLimiter::with_limits(1, Duration::from_millis(50));
        limiter.record_request();
        assert!(!limiter.can_proceed());

        tokio::time::timeout(Duration::from_secs(2), limiter.await_turn())
            .await
            .expect("slot should open once the window drains");
        assert!(limiter.can_proceed());
    }
}
