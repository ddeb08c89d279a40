//! The backoff strategy trait, fixed backoff and the jitter wrapper.

use rand::Rng;
use std::error::Error;
use std::time::Duration;

/// Computes how long to wait before the next attempt.
///
/// A strategy is a pure function of the error that just occurred and the
/// 1-based attempt number at which it occurred. It must not keep mutable
/// state between calls: one strategy is shared by every run that uses the
/// same [`RetryOptions`](crate::RetryOptions), possibly concurrently.
///
/// Any `Fn(&(dyn Error + 'static), u32) -> Duration` closure is a strategy,
/// so error-aware backoff (for example honouring a server's retry-after hint)
/// does not need a dedicated type.
///
/// # Examples
///
/// ```rust
/// use turboretry::backoff::{BackoffStrategy, FixedBackoff};
/// use std::time::Duration;
///
/// let fixed = FixedBackoff::new(Duration::from_millis(200));
/// let err = std::io::Error::other("boom");
/// assert_eq!(fixed.next_delay(&err, 3), Duration::from_millis(200));
///
/// // Closures are strategies too.
/// let linear = |_: &(dyn std::error::Error + 'static), attempt: u32| {
///     Duration::from_millis(10 * u64::from(attempt))
/// };
/// assert_eq!(linear.next_delay(&err, 2), Duration::from_millis(20));
/// ```
pub trait BackoffStrategy: Send + Sync {
    /// Delay before the attempt following `attempt`.
    ///
    /// # Parameters
    /// - `error`: The error returned by the failed attempt
    /// - `attempt`: The attempt that failed (1-indexed)
    fn next_delay(&self, error: &(dyn Error + 'static), attempt: u32) -> Duration;

    /// Add `uniform[0, jitter)` to every delay of this strategy.
    ///
    /// The jitter is added unconditionally, so a capped strategy may exceed
    /// its cap by up to `jitter`. Use the randomized variants of the built-in
    /// strategies when the cap must hold.
    fn with_jitter(self, jitter: Duration) -> Jittered<Self>
    where
        Self: Sized,
    {
        Jittered::new(self, jitter)
    }
}

impl<F> BackoffStrategy for F
where
    F: Fn(&(dyn Error + 'static), u32) -> Duration + Send + Sync,
{
    fn next_delay(&self, error: &(dyn Error + 'static), attempt: u32) -> Duration {
        self(error, attempt)
    }
}

/// Wait the same amount of time between every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    /// Create a fixed backoff of `delay`.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl BackoffStrategy for FixedBackoff {
    fn next_delay(&self, _error: &(dyn Error + 'static), _attempt: u32) -> Duration {
        self.delay
    }
}

/// Wraps a strategy and adds random jitter to every delay.
///
/// See [`BackoffStrategy::with_jitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jittered<S> {
    inner: S,
    jitter: Duration,
}

impl<S> Jittered<S> {
    /// Wrap `inner`, adding `uniform[0, jitter)` to each delay.
    pub fn new(inner: S, jitter: Duration) -> Self {
        Self { inner, jitter }
    }

    /// The wrapped strategy.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S> BackoffStrategy for Jittered<S>
where
    S: BackoffStrategy,
{
    fn next_delay(&self, error: &(dyn Error + 'static), attempt: u32) -> Duration {
        self.inner
            .next_delay(error, attempt)
            .saturating_add(random_jitter(self.jitter))
    }
}

/// Fixed backoff plus random jitter.
pub type RandomBackoff = Jittered<FixedBackoff>;

impl RandomBackoff {
    /// `delay + uniform[0, jitter)` between every attempt.
    pub fn random(delay: Duration, jitter: Duration) -> Self {
        FixedBackoff::new(delay).with_jitter(jitter)
    }
}

/// Draw `uniform[0, jitter)`. A zero jitter draws zero.
pub(crate) fn random_jitter(jitter: Duration) -> Duration {
    let bound = u64::try_from(jitter.as_nanos()).unwrap_or(u64::MAX);
    if bound == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rand::thread_rng().gen_range(0..bound))
}

/// Apply the cap and jitter policy shared by the randomized exponential and
/// incremental strategies.
///
/// - no cap (`max` is zero): `base`, jitter is not applied
/// - `base` at or above the cap: `max - jitter`
/// - otherwise: `min(base + jitter, max)`
pub(crate) fn cap_with_jitter(base: Duration, max: Duration, jitter: Duration) -> Duration {
    if max.is_zero() {
        return base;
    }
    let jitter = random_jitter(jitter);
    if base >= max {
        return max.saturating_sub(jitter);
    }
    base.saturating_add(jitter).min(max)
}

/// Apply the cap alone. A zero `max` means uncapped.
pub(crate) fn cap(base: Duration, max: Duration) -> Duration {
    if max.is_zero() { base } else { base.min(max) }
}
