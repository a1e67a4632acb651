//! Minimum-interval request gate.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::debug;

/// Enforces a minimum interval between consecutive requests of one client.
///
/// The gate is local to the owning client; separate clients and processes
/// do not coordinate.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter. A zero interval disables waiting.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Returns the configured minimum interval.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Returns how long a request issued at `now` would have to wait.
    #[must_use]
    pub fn wait_duration(&self, now: Instant) -> Duration {
        let last = *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        remaining(self.min_interval, last, now)
    }

    /// Claims the next free slot for a request issued at `now` and returns
    /// how long the caller has to sleep before using it.
    ///
    /// The slot is stored before the lock is released, so concurrent callers
    /// queue up one interval apart instead of all waking at once.
    fn reserve(&self, now: Instant) -> Duration {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let next = last.map_or(now, |last| now.max(last + self.min_interval));
        *last = Some(next);
        next.saturating_duration_since(now)
    }

    /// Blocks until this request's slot comes up.
    pub fn acquire(&self) {
        let wait = self.reserve(Instant::now());
        if !wait.is_zero() {
            debug!("Rate limiter sleeping for {wait:?}");
            std::thread::sleep(wait);
        }
    }

    /// Records that a request just completed.
    ///
    /// Never moves the gate backwards past a slot another caller reserved.
    pub fn record(&self) {
        let now = Instant::now();
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last = Some(last.map_or(now, |last| last.max(now)));
    }
}

fn remaining(min_interval: Duration, last: Option<Instant>, now: Instant) -> Duration {
    last.map_or(Duration::ZERO, |last| {
        (last + min_interval).saturating_duration_since(now)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_request_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_millis(200));
        assert_eq!(limiter.wait_duration(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_remaining() {
        let last = Instant::now();
        let interval = Duration::from_millis(200);
        assert_eq!(
            remaining(interval, Some(last), last + Duration::from_millis(50)),
            Duration::from_millis(150)
        );
        assert_eq!(
            remaining(interval, Some(last), last + Duration::from_millis(500)),
            Duration::ZERO
        );
        assert_eq!(remaining(Duration::ZERO, Some(last), last), Duration::ZERO);
    }

    #[test]
    fn test_reserve_queues_callers() {
        let limiter = RateLimiter::new(Duration::from_millis(200));
        let now = Instant::now();
        assert_eq!(limiter.reserve(now), Duration::ZERO);
        assert_eq!(limiter.reserve(now), Duration::from_millis(200));
        assert_eq!(limiter.reserve(now), Duration::from_millis(400));
    }

    #[test]
    fn test_record_keeps_reserved_slot() {
        let limiter = RateLimiter::new(Duration::from_millis(200));
        let now = Instant::now();
        limiter.reserve(now);
        limiter.reserve(now);
        limiter.record();
        assert!(limiter.wait_duration(now) >= Duration::from_millis(400));
    }

    #[test]
    fn test_concurrent_acquire_is_spaced() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    limiter.acquire();
                    Instant::now()
                })
            })
            .collect();
        let mut done: Vec<Instant> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        done.sort();
        assert!(done[1].duration_since(done[0]) >= Duration::from_millis(90));
    }

    #[test]
    fn test_acquire_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(30));
        limiter.record();
        let started = Instant::now();
        limiter.acquire();
        limiter.record();
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(limiter.wait_duration(Instant::now()) > Duration::ZERO);
    }
}
