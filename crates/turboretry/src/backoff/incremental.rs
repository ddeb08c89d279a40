//! Incremental (linear) backoff.

use super::strategy::{BackoffStrategy, cap, cap_with_jitter};
use std::error::Error;
use std::time::Duration;

/// Backoff that grows by a fixed increment each attempt:
/// `initial_delay + increment * (attempt - 1)`.
///
/// A zero `max_delay` means uncapped. With jitter configured the same
/// cap policy as [`ExponentialBackoff`](super::ExponentialBackoff) applies:
/// once the cap is reached the jitter is subtracted from it, and an
/// uncapped backoff ignores the jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementalBackoff {
    initial_delay: Duration,
    increment: Duration,
    max_delay: Duration,
    jitter: Duration,
}

impl IncrementalBackoff {
    /// Incremental backoff without jitter.
    pub fn new(initial_delay: Duration, increment: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            increment,
            max_delay,
            jitter: Duration::ZERO,
        }
    }

    /// Incremental backoff with random jitter that respects `max_delay`.
    pub fn randomized(
        initial_delay: Duration,
        increment: Duration,
        max_delay: Duration,
        jitter: Duration,
    ) -> Self {
        Self {
            jitter,
            ..Self::new(initial_delay, increment, max_delay)
        }
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        let steps = attempt.saturating_sub(1);
        let grown = self.increment.checked_mul(steps).unwrap_or(Duration::MAX);
        self.initial_delay.saturating_add(grown)
    }
}

impl BackoffStrategy for IncrementalBackoff {
    fn next_delay(&self, _error: &(dyn Error + 'static), attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter.is_zero() {
            cap(base, self.max_delay)
        } else {
            cap_with_jitter(base, self.max_delay, self.jitter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err() -> std::io::Error {
        std::io::Error::other("failed")
    }

    #[test]
    fn test_incremental_delay_calculation() {
        let backoff = IncrementalBackoff::new(
            Duration::from_millis(200),
            Duration::from_millis(200),
            Duration::ZERO,
        );

        assert_eq!(backoff.next_delay(&err(), 1), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(&err(), 2), Duration::from_millis(400));
        assert_eq!(backoff.next_delay(&err(), 4), Duration::from_millis(800));
    }

    #[test]
    fn test_incremental_cap() {
        let backoff = IncrementalBackoff::new(
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_secs(3),
        );

        assert_eq!(backoff.next_delay(&err(), 2), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(&err(), 10), Duration::from_secs(3));
        assert_eq!(backoff.next_delay(&err(), u32::MAX), Duration::from_secs(3));
    }

    #[test]
    fn test_uncapped_randomized_is_exact() {
        let backoff = IncrementalBackoff::randomized(
            Duration::from_millis(200),
            Duration::from_millis(200),
            Duration::ZERO,
            Duration::from_millis(100),
        );

        for _ in 0..10 {
            assert_eq!(backoff.next_delay(&err(), 3), Duration::from_millis(600));
        }
    }

    #[test]
    fn test_randomized_at_cap() {
        let backoff = IncrementalBackoff::randomized(
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_secs(3),
            Duration::from_millis(100),
        );

        for _ in 0..20 {
            let delay = backoff.next_delay(&err(), 5);
            assert!(delay > Duration::from_millis(2900) && delay <= Duration::from_secs(3));

            let below = backoff.next_delay(&err(), 1);
            assert!(below >= Duration::from_secs(1) && below < Duration::from_millis(1100));
        }
    }
}
