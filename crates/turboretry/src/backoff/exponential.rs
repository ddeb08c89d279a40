//! Exponential backoff with optional jitter.

use super::strategy::{BackoffStrategy, cap, cap_with_jitter};
use crate::DEFAULT_MULTIPLIER;
use std::error::Error;
use std::time::Duration;

/// Exponential backoff strategy with an optional cap and jitter.
///
/// Delays grow exponentially: `initial_delay * multiplier^(attempt - 1)`.
///
/// # Mathematical Formula
///
/// For the attempt `n` that just failed (1-indexed):
/// ```text
/// base_delay = initial_delay * (multiplier ^ (n - 1))
///
/// without jitter:
///   delay = min(base_delay, max_delay)            (max_delay = 0: uncapped)
///
/// with jitter j = random(0, jitter):
///   max_delay = 0            -> base_delay    (jitter needs a cap)
///   base_delay >= max_delay  -> max_delay - j
///   otherwise                -> min(base_delay + j, max_delay)
/// ```
///
/// Once the cap is reached the jitter is subtracted from the cap instead of
/// added, so the worst-case wait never exceeds `max_delay`.
///
/// # Examples
///
/// ```rust
/// use turboretry::backoff::{BackoffStrategy, ExponentialBackoff};
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .initial_delay(Duration::from_millis(100))
///     .multiplier(2.0)
///     .max_delay(Duration::from_secs(30))
///     .build();
///
/// let err = std::io::Error::other("boom");
/// assert_eq!(backoff.next_delay(&err, 1), Duration::from_millis(100));
/// assert_eq!(backoff.next_delay(&err, 3), Duration::from_millis(400));
/// ```
///
/// # Performance Characteristics
///
/// - **Memory**: O(1), no allocations
/// - **CPU**: O(1) per call, simple arithmetic plus one random number when
///   jitter is configured
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
    jitter: Duration,
}

impl ExponentialBackoff {
    /// Exponential backoff without jitter. A zero `max_delay` means uncapped.
    pub fn new(initial_delay: Duration, multiplier: f64, max_delay: Duration) -> Self {
        Self::builder()
            .initial_delay(initial_delay)
            .multiplier(multiplier)
            .max_delay(max_delay)
            .build()
    }

    /// Exponential backoff with random jitter that respects `max_delay`.
    ///
    /// Jitter only applies when `max_delay` is non-zero; an uncapped
    /// randomized backoff behaves like [`ExponentialBackoff::new`].
    pub fn randomized(
        initial_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
        jitter: Duration,
    ) -> Self {
        Self::builder()
            .initial_delay(initial_delay)
            .multiplier(multiplier)
            .max_delay(max_delay)
            .jitter(jitter)
            .build()
    }

    /// Create a new builder for configuring exponential backoff.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use turboretry::backoff::ExponentialBackoff;
    /// use std::time::Duration;
    ///
    /// let backoff = ExponentialBackoff::builder()
    ///     .initial_delay(Duration::from_millis(100))
    ///     .jitter(Duration::from_millis(50))
    ///     .build();
    /// ```
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// Uncapped, unjittered delay for `attempt`.
    fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        // Float to int casts saturate, so overflow lands on u64::MAX.
        Duration::from_nanos(nanos as u64)
    }
}

impl Default for ExponentialBackoff {
    /// Defaults:
    /// - `initial_delay`: 200ms
    /// - `multiplier`: 2.0 (doubles each time)
    /// - `max_delay`: uncapped
    /// - `jitter`: none
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn next_delay(&self, _error: &(dyn Error + 'static), attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter.is_zero() {
            cap(base, self.max_delay)
        } else {
            cap_with_jitter(base, self.max_delay, self.jitter)
        }
    }
}

/// Builder for configuring [`ExponentialBackoff`].
///
/// # Examples
///
/// ```rust
/// use turboretry::backoff::ExponentialBackoff;
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30))
///     .multiplier(3.0)
///     .jitter(Duration::from_millis(20))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Option<Duration>,
    multiplier: Option<f64>,
    max_delay: Option<Duration>,
    jitter: Option<Duration>,
}

impl ExponentialBackoffBuilder {
    /// Set the delay after the first failure.
    ///
    /// Default: 200ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the exponential multiplier. Values below 1.0 are raised to 1.0.
    ///
    /// Default: 2.0
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(if multiplier.is_nan() {
            DEFAULT_MULTIPLIER
        } else {
            multiplier.max(1.0)
        });
        self
    }

    /// Set the maximum delay. Zero means uncapped.
    ///
    /// Default: uncapped
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the jitter bound. Zero disables jitter.
    ///
    /// Default: none
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Build the `ExponentialBackoff` instance.
    ///
    /// Uses default values for any unset parameters.
    pub fn build(self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_delay: self.initial_delay.unwrap_or(crate::DEFAULT_BACKOFF),
            multiplier: self.multiplier.unwrap_or(DEFAULT_MULTIPLIER),
            max_delay: self.max_delay.unwrap_or(Duration::ZERO),
            jitter: self.jitter.unwrap_or(Duration::ZERO),
        }
    }
}
