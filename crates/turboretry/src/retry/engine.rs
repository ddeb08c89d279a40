//! The attempt-loop state machine shared by the async and blocking drivers.
//!
//! A driver owns the actual loop and the way it waits; [`RetryRun`] owns
//! everything else: attempt counting, classification, the attempt limit,
//! backoff computation, notification and error aggregation.
//!
//! ```text
//! CheckCancel -> Invoke -> Classify -> Backoff -> Notify -> CheckCancel
//!      |            |          |           |
//!   Terminal     Success    Terminal    Terminal (wait interrupted)
//! ```

use crate::cancel::CancelContext;
use crate::error::{CancelError, RetryError, is_cancellation};
use crate::options::RetryOptions;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, warn};

/// What a driver should do after a failed attempt.
pub(crate) enum Step<E> {
    /// Wait for `delay` (if any), then call [`RetryRun::after_backoff`].
    Retry { error: E, delay: Option<Duration> },
    /// Stop and return this error.
    Stop(RetryError<E>),
}

/// Per-run state: the attempt counter and the last retryable error.
pub(crate) struct RetryRun<'a, E> {
    options: &'a RetryOptions,
    context: Option<&'a CancelContext>,
    attempts: u32,
    last_retryable: Option<E>,
}

impl<'a, E> RetryRun<'a, E>
where
    E: Error + 'static,
{
    /// `context` takes precedence over the context stored in `options`.
    pub(crate) fn new(options: &'a RetryOptions, context: Option<&'a CancelContext>) -> Self {
        Self {
            options,
            context: context.or_else(|| options.context()),
            attempts: 0,
            last_retryable: None,
        }
    }

    pub(crate) fn context(&self) -> Option<&'a CancelContext> {
        self.context
    }

    /// Fail if the context is already cancelled or expired.
    pub(crate) fn check_cancel(&mut self) -> Result<(), RetryError<E>> {
        match self.context.and_then(CancelContext::err) {
            Some(reason) => Err(self.cancelled(reason)),
            None => Ok(()),
        }
    }

    /// Count one invocation of the operation.
    pub(crate) fn begin_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    pub(crate) fn succeeded(&self) {
        if self.attempts > 1 {
            debug!(attempts = self.attempts, "operation succeeded after retries");
        }
    }

    /// Classify a failure, enforce the attempt limit and compute the delay.
    pub(crate) fn on_failure(&mut self, error: E) -> Step<E> {
        let attempts = self.attempts;

        if !self.options.is_retryable(&error) {
            debug!(attempt = attempts, error = %error, "error is not retryable");
            let previous = self.joined_previous(&error);
            return Step::Stop(RetryError::Aborted {
                attempts,
                source: error,
                previous,
            });
        }

        let limit = self.options.max_attempts();
        if limit > 0 && attempts >= limit {
            warn!(attempts, error = %error, "retry limit exceeded");
            let previous = self.joined_previous(&error);
            return Step::Stop(RetryError::LimitExceeded {
                attempts,
                source: error,
                previous,
            });
        }

        let delay = self.options.backoff_delay(&error, attempts);
        debug!(attempt = attempts, delay = ?delay, error = %error, "retrying operation");
        Step::Retry { error, delay }
    }

    /// Notify handlers and remember the error once the wait is over.
    pub(crate) fn after_backoff(&mut self, error: E) {
        self.options.notify(&error, self.attempts);
        self.remember(error);
    }

    /// The wait before the next attempt was cut short by the context.
    pub(crate) fn interrupted(&mut self, error: E, reason: CancelError) -> RetryError<E> {
        self.remember(error);
        self.cancelled(reason)
    }

    fn remember(&mut self, error: E) {
        if !is_cancellation(&error) {
            self.last_retryable = Some(error);
        }
    }

    fn cancelled(&mut self, reason: CancelError) -> RetryError<E> {
        warn!(attempts = self.attempts, %reason, "retry cancelled");
        let previous = if self.options.join_cancel_error() {
            self.last_retryable.take()
        } else {
            None
        };
        RetryError::Cancelled {
            attempts: self.attempts,
            reason,
            previous,
        }
    }

    /// The last retryable error, if `error` is a cancellation error and the
    /// options ask for it to be joined.
    fn joined_previous(&mut self, error: &E) -> Option<E> {
        if self.options.join_cancel_error() && is_cancellation(error) {
            self.last_retryable.take()
        } else {
            None
        }
    }
}
