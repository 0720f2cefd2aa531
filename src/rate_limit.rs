//! Minimum spacing between outbound requests.
//!
//! The upstream throttles aggressively and does not document its limits, so
//! every request start is spaced at least `min_interval` after the previous
//! one. Spacing is measured between invocations of [`RateLimiter::enforce`],
//! not between responses, so slow responses do not let requests bunch up.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default spacing between request starts.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Single-flight limiter shared by every call made through one client.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next request may start, then claim the slot.
    ///
    /// The lock is held across the wait, so concurrent callers line up
    /// behind each other instead of all waking at the same instant.
    pub async fn enforce(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::trace!(?wait, "rate limiter delaying request");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
