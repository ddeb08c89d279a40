//! Error types returned by the retry engine.
//!
//! Every terminal exit of a retry run produces a [`RetryError`]. The variant
//! tells the caller *why* the run stopped, while the wrapped operation error
//! stays reachable through [`std::error::Error::source`] and the inspection
//! helpers on [`RetryError`].

use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias for retried operations.
pub type RetryResult<T, E> = std::result::Result<T, RetryError<E>>;

/// Cancellation reported by a [`CancelContext`](crate::CancelContext).
///
/// Operations may also return this error (directly or somewhere in their
/// source chain) to signal that they observed cancellation themselves. Such
/// errors are not retried by default and are never remembered as the last
/// retryable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CancelError {
    /// The context was cancelled explicitly.
    #[error("operation cancelled")]
    Cancelled,

    /// The context deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Terminal error of a retry run.
///
/// `previous` holds the last retryable error seen before the terminal one.
/// It is only populated when the run was configured with
/// `join_cancel_error(true)` and the run ended because of cancellation.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation returned an error that is not retryable.
    #[error("operation failed with a non-retryable error on attempt {attempts}")]
    Aborted {
        /// Number of invocations made.
        attempts: u32,
        /// The error that stopped the run.
        source: E,
        /// Last retryable error, when joined.
        previous: Option<E>,
    },

    /// The attempt limit was reached without success.
    #[error("retry limit exceeded after {attempts} attempts")]
    LimitExceeded {
        /// Number of invocations made.
        attempts: u32,
        /// The error returned by the final attempt.
        source: E,
        /// Last retryable error, when joined.
        previous: Option<E>,
    },

    /// The cancellation context fired before another attempt could start.
    #[error("{reason} after {attempts} attempts")]
    Cancelled {
        /// Number of invocations made.
        attempts: u32,
        /// Why the context fired.
        #[source]
        reason: CancelError,
        /// Last retryable error, when joined.
        previous: Option<E>,
    },
}

impl<E> RetryError<E>
where
    E: StdError + 'static,
{
    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Aborted { attempts, .. }
            | Self::LimitExceeded { attempts, .. }
            | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// `true` if the attempt limit was reached.
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. })
    }

    /// `true` if the run ended because of cancellation, whether reported by
    /// the context or returned by the operation itself.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_reason().is_some()
    }

    /// `true` if the cancellation was caused by a passed deadline.
    pub fn is_deadline_exceeded(&self) -> bool {
        self.cancel_reason() == Some(CancelError::DeadlineExceeded)
    }

    /// The cancellation reason, if any cancellation error ended the run.
    pub fn cancel_reason(&self) -> Option<CancelError> {
        match self {
            Self::Cancelled { reason, .. } => Some(*reason),
            Self::Aborted { source, .. } | Self::LimitExceeded { source, .. } => {
                find_in_chain::<CancelError>(source).copied()
            }
        }
    }

    /// The operation error that ended the run, if the run ended on one.
    pub fn source_error(&self) -> Option<&E> {
        match self {
            Self::Aborted { source, .. } | Self::LimitExceeded { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }

    /// The joined last retryable error.
    pub fn previous(&self) -> Option<&E> {
        match self {
            Self::Aborted { previous, .. }
            | Self::LimitExceeded { previous, .. }
            | Self::Cancelled { previous, .. } => previous.as_ref(),
        }
    }

    /// Consume the error, returning the operation error that ended the run.
    ///
    /// For [`RetryError::Cancelled`] this is the joined previous error, if
    /// any.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Aborted { source, .. } | Self::LimitExceeded { source, .. } => Some(source),
            Self::Cancelled { previous, .. } => previous,
        }
    }

    /// Iterate every error reachable from this one: the wrapped error's
    /// chain first, then the joined previous error's chain.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let primary: Option<&(dyn StdError + 'static)> = match self {
            Self::Aborted { source, .. } | Self::LimitExceeded { source, .. } => Some(source),
            Self::Cancelled { reason, .. } => Some(reason),
        };
        let previous = self.previous().map(|e| e as &(dyn StdError + 'static));

        primary
            .into_iter()
            .flat_map(chain)
            .chain(previous.into_iter().flat_map(chain))
    }

    /// `true` if an error equal to `target` appears anywhere among
    /// [`causes`](Self::causes).
    pub fn contains<T>(&self, target: &T) -> bool
    where
        T: StdError + PartialEq + 'static,
    {
        self.causes()
            .any(|cause| cause.downcast_ref::<T>() == Some(target))
    }

    /// `true` if an error of type `T` appears anywhere among
    /// [`causes`](Self::causes).
    pub fn contains_type<T>(&self) -> bool
    where
        T: StdError + 'static,
    {
        self.causes().any(|cause| cause.is::<T>())
    }
}

/// Walk an error and its `source()` chain.
pub fn chain<'a>(
    error: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(error), |&e| e.source())
}

/// Find the first error of type `T` in the chain starting at `error`.
pub fn find_in_chain<'a, T>(error: &'a (dyn StdError + 'static)) -> Option<&'a T>
where
    T: StdError + 'static,
{
    chain(error).find_map(|e| e.downcast_ref::<T>())
}

/// `true` if `error` or anything in its source chain is a [`CancelError`].
pub fn is_cancellation(error: &(dyn StdError + 'static)) -> bool {
    find_in_chain::<CancelError>(error).is_some()
}
