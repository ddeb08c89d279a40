//! Retry configuration.
//!
//! [`RetryOptions`] is an immutable value built with [`RetryOptionsBuilder`].
//! Once built it is only read by the engine, so a single value can be stored
//! globally and shared by any number of concurrent runs. Per-run tweaks start
//! from a copy via [`RetryOptionsBuilder::copy_from`] or
//! [`RetryOptions::to_builder`] and never touch the original.

use crate::backoff::{BackoffStrategy, ExponentialBackoff, FixedBackoff, RandomBackoff};
use crate::cancel::CancelContext;
use crate::error::is_cancellation;
use crate::matcher::{self, ErrorMatcher, any_match};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Default number of attempts (1 initial attempt + 4 retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

/// Default multiplier of the exponential backoff shortcuts.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Upper bound applied to every computed backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60 * 60);

/// Handler invoked once per retry with the error and the attempt that failed.
pub type RetryHandler = Arc<dyn Fn(&(dyn Error + 'static), u32) + Send + Sync>;

/// Build a [`RetryHandler`] from a closure.
pub fn handler<F>(f: F) -> RetryHandler
where
    F: Fn(&(dyn Error + 'static), u32) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A handler that logs every retry through `tracing`.
///
/// Events are emitted at `level` with `retry` and `err` fields. Once the
/// attempt reaches [`DEFAULT_MAX_ATTEMPTS`] the level is raised to
/// [`Level::ERROR`].
pub fn retry_logger(level: Level, message: impl Into<String>) -> RetryHandler {
    let message = message.into();
    handler(move |err, attempt| {
        let level = if attempt >= DEFAULT_MAX_ATTEMPTS {
            Level::ERROR
        } else {
            level
        };
        log_retry(level, &message, err, attempt);
    })
}

fn log_retry(level: Level, message: &str, err: &(dyn Error + 'static), attempt: u32) {
    if level == Level::ERROR {
        tracing::error!(retry = attempt, err = %err, "{}", message);
    } else if level == Level::WARN {
        tracing::warn!(retry = attempt, err = %err, "{}", message);
    } else if level == Level::INFO {
        tracing::info!(retry = attempt, err = %err, "{}", message);
    } else if level == Level::DEBUG {
        tracing::debug!(retry = attempt, err = %err, "{}", message);
    } else {
        tracing::trace!(retry = attempt, err = %err, "{}", message);
    }
}

/// Configuration of a retry run.
///
/// # Defaults
///
/// - `max_attempts`: 5
/// - backoff: 200ms plus up to 100ms of random jitter
/// - no matchers: every error is retried except cancellation errors
/// - no retry handlers
/// - `join_cancel_error`: false
/// - `retry_on_cancel_error`: false
/// - no cancellation context
///
/// # Examples
///
/// ```rust
/// use turboretry::RetryOptions;
/// use std::time::Duration;
///
/// let options = RetryOptions::builder()
///     .max_attempts(3)
///     .fixed_backoff(Duration::from_millis(50))
///     .no_retry_for(std::fmt::Error)
///     .build();
///
/// assert_eq!(options.max_attempts(), 3);
/// ```
#[derive(Clone)]
pub struct RetryOptions {
    max_attempts: u32,
    retry_if: Vec<ErrorMatcher>,
    no_retry_if: Vec<ErrorMatcher>,
    backoff: Option<Arc<dyn BackoffStrategy>>,
    on_retry: Vec<RetryHandler>,
    join_cancel_error: bool,
    retry_on_cancel_error: bool,
    context: Option<CancelContext>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_if: Vec::new(),
            no_retry_if: Vec::new(),
            backoff: Some(Arc::new(RandomBackoff::random(
                DEFAULT_BACKOFF,
                DEFAULT_BACKOFF / 2,
            ))),
            on_retry: Vec::new(),
            join_cancel_error: false,
            retry_on_cancel_error: false,
            context: None,
        }
    }
}

impl RetryOptions {
    /// Options with the defaults listed on the type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building options from the defaults.
    pub fn builder() -> RetryOptionsBuilder {
        RetryOptionsBuilder::default()
    }

    /// Start building options from a copy of `self`.
    pub fn to_builder(&self) -> RetryOptionsBuilder {
        RetryOptionsBuilder {
            options: self.clone(),
        }
    }

    /// Maximum number of attempts. `0` means unlimited.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether the last retryable error is joined into cancellation errors.
    pub fn join_cancel_error(&self) -> bool {
        self.join_cancel_error
    }

    /// Whether errors carrying a [`CancelError`](crate::CancelError) may be
    /// retried.
    pub fn retry_on_cancel_error(&self) -> bool {
        self.retry_on_cancel_error
    }

    /// The configured cancellation context.
    pub fn context(&self) -> Option<&CancelContext> {
        self.context.as_ref()
    }

    /// Whether a backoff strategy is configured.
    pub fn has_backoff(&self) -> bool {
        self.backoff.is_some()
    }

    /// Classify `err`: `true` if it may be retried.
    ///
    /// Exclusions win over everything else. Cancellation errors are
    /// excluded unless `retry_on_cancel_error` is set. With no retry
    /// matchers every remaining error is retryable.
    pub fn is_retryable(&self, err: &(dyn Error + 'static)) -> bool {
        if any_match(&self.no_retry_if, err) {
            return false;
        }
        if !self.retry_on_cancel_error && is_cancellation(err) {
            return false;
        }
        self.retry_if.is_empty() || any_match(&self.retry_if, err)
    }

    /// The delay before the next attempt, clamped to [`MAX_BACKOFF`].
    /// `None` when no strategy is configured.
    pub fn backoff_delay(&self, err: &(dyn Error + 'static), attempt: u32) -> Option<Duration> {
        self.backoff
            .as_ref()
            .map(|strategy| strategy.next_delay(err, attempt).min(MAX_BACKOFF))
    }

    /// Invoke every retry handler in registration order.
    pub(crate) fn notify(&self, err: &(dyn Error + 'static), attempt: u32) {
        for handler in &self.on_retry {
            handler(err, attempt);
        }
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("retry_if", &self.retry_if.len())
            .field("no_retry_if", &self.no_retry_if.len())
            .field("backoff", &self.backoff.is_some())
            .field("on_retry", &self.on_retry.len())
            .field("join_cancel_error", &self.join_cancel_error)
            .field("retry_on_cancel_error", &self.retry_on_cancel_error)
            .field("context", &self.context)
            .finish()
    }
}

/// Builder for [`RetryOptions`].
///
/// Later calls override earlier ones, except [`on_retry`](Self::on_retry)
/// and [`on_retry_logging`](Self::on_retry_logging), which append handlers
/// that all run in order.
#[derive(Debug, Clone, Default)]
#[must_use = "builder does nothing until `build()` is called or it is passed to a retry function"]
pub struct RetryOptionsBuilder {
    options: RetryOptions,
}

impl RetryOptionsBuilder {
    /// Set the maximum number of attempts, including the first one.
    ///
    /// `0` means unlimited, `1` disables retries.
    ///
    /// Default: 5
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.options.max_attempts = attempts;
        self
    }

    /// Retry until success, a non-retryable error or cancellation.
    pub fn unlimited_attempts(self) -> Self {
        self.max_attempts(0)
    }

    /// Only retry errors matched by `predicate`.
    pub fn retry_if<F>(self, predicate: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        self.retry_if_any([matcher::matcher(predicate)])
    }

    /// Only retry errors matched by at least one of `matchers`.
    pub fn retry_if_any(mut self, matchers: impl IntoIterator<Item = ErrorMatcher>) -> Self {
        self.options.retry_if = matchers.into_iter().collect();
        self
    }

    /// Only retry errors equal to `error`, anywhere in the chain.
    pub fn retry_for<T>(self, error: T) -> Self
    where
        T: Error + PartialEq + Send + Sync + 'static,
    {
        self.retry_if_any([matcher::err_is(error)])
    }

    /// Only retry errors equal to one of `errors`, anywhere in the chain.
    pub fn retry_for_any<T>(self, errors: impl IntoIterator<Item = T>) -> Self
    where
        T: Error + PartialEq + Send + Sync + 'static,
    {
        self.retry_if_any([matcher::err_is_any(errors)])
    }

    /// Never retry errors matched by `predicate`.
    pub fn no_retry_if<F>(self, predicate: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        self.no_retry_if_any([matcher::matcher(predicate)])
    }

    /// Never retry errors matched by any of `matchers`.
    pub fn no_retry_if_any(mut self, matchers: impl IntoIterator<Item = ErrorMatcher>) -> Self {
        self.options.no_retry_if = matchers.into_iter().collect();
        self
    }

    /// Never retry errors equal to `error`, anywhere in the chain.
    pub fn no_retry_for<T>(self, error: T) -> Self
    where
        T: Error + PartialEq + Send + Sync + 'static,
    {
        self.no_retry_if_any([matcher::err_is(error)])
    }

    /// Never retry errors equal to one of `errors`, anywhere in the chain.
    pub fn no_retry_for_any<T>(self, errors: impl IntoIterator<Item = T>) -> Self
    where
        T: Error + PartialEq + Send + Sync + 'static,
    {
        self.no_retry_if_any([matcher::err_is_any(errors)])
    }

    /// Allow errors carrying a [`CancelError`](crate::CancelError) to be
    /// retried like any other error.
    ///
    /// Default: false
    pub fn retry_on_cancel_error(mut self, retry: bool) -> Self {
        self.options.retry_on_cancel_error = retry;
        self
    }

    /// Use `strategy` to compute the wait between attempts.
    pub fn backoff<S>(self, strategy: S) -> Self
    where
        S: BackoffStrategy + 'static,
    {
        self.shared_backoff(Arc::new(strategy))
    }

    /// Use an already shared strategy.
    pub fn shared_backoff(mut self, strategy: Arc<dyn BackoffStrategy>) -> Self {
        self.options.backoff = Some(strategy);
        self
    }

    /// Retry immediately, without waiting.
    pub fn no_backoff(mut self) -> Self {
        self.options.backoff = None;
        self
    }

    /// Wait `delay` between attempts.
    pub fn fixed_backoff(self, delay: Duration) -> Self {
        self.backoff(FixedBackoff::new(delay))
    }

    /// Wait `delay` plus up to `delay / 2` of random jitter between attempts.
    ///
    /// Build a [`RandomBackoff`] directly for a different jitter.
    pub fn random_backoff(self, delay: Duration) -> Self {
        self.backoff(RandomBackoff::random(delay, delay / 2))
    }

    /// Exponential backoff doubling from `initial` up to `max` (zero:
    /// uncapped).
    pub fn exponential_backoff(self, initial: Duration, max: Duration) -> Self {
        self.backoff(ExponentialBackoff::new(initial, DEFAULT_MULTIPLIER, max))
    }

    /// Exponential backoff doubling from `initial` up to `max`, with up to
    /// `initial / 2` of random jitter. A zero `max` disables the jitter.
    pub fn exponential_random_backoff(self, initial: Duration, max: Duration) -> Self {
        self.backoff(ExponentialBackoff::randomized(
            initial,
            DEFAULT_MULTIPLIER,
            max,
            initial / 2,
        ))
    }

    /// Add a handler called once per retry, after the backoff wait.
    ///
    /// Handlers are not called for the final failure. Panics raised by a
    /// handler propagate to the caller of the retry function.
    pub fn on_retry<F>(self, f: F) -> Self
    where
        F: Fn(&(dyn Error + 'static), u32) + Send + Sync + 'static,
    {
        self.on_retry_handler(handler(f))
    }

    /// Add an already built handler.
    pub fn on_retry_handler(mut self, handler: RetryHandler) -> Self {
        self.options.on_retry.push(handler);
        self
    }

    /// Add a handler that logs each retry. See [`retry_logger`].
    pub fn on_retry_logging(self, level: Level, message: impl Into<String>) -> Self {
        self.on_retry_handler(retry_logger(level, message))
    }

    /// Join the last retryable error into cancellation errors.
    ///
    /// Default: false
    pub fn join_cancel_error(mut self, join: bool) -> Self {
        self.options.join_cancel_error = join;
        self
    }

    /// Observe `ctx` and stop retrying once it is cancelled or expired.
    pub fn context(mut self, ctx: CancelContext) -> Self {
        self.options.context = Some(ctx);
        self
    }

    /// Replace everything configured so far with a copy of `options`.
    /// Further builder calls still apply on top of the copy.
    pub fn copy_from(mut self, options: &RetryOptions) -> Self {
        self.options = options.clone();
        self
    }

    /// Build the options.
    pub fn build(self) -> RetryOptions {
        self.options
    }
}

impl From<RetryOptionsBuilder> for RetryOptions {
    fn from(builder: RetryOptionsBuilder) -> Self {
        builder.build()
    }
}
