//! Cancellation context observed by the retry engine.

use crate::error::CancelError;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A caller-owned cancellation signal.
///
/// Combines an explicit [`CancellationToken`] with an optional deadline. The
/// retry engine only observes the context: it checks it before every attempt
/// and, in the async driver, while waiting between attempts. It never cancels
/// the token itself.
///
/// Cloning is cheap and clones share the same token.
///
/// # Examples
///
/// ```rust
/// use turboretry::CancelContext;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = CancelContext::new().with_timeout(Duration::from_secs(5));
/// assert!(ctx.err().is_none());
///
/// ctx.cancel();
/// assert!(ctx.err().is_some());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelContext {
    /// Create a context that is never cancelled until [`cancel`](Self::cancel)
    /// is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token, for example one owned by a service's shutdown
    /// logic.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Set an absolute deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Set a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context. Cancelling the child does not cancel `self`,
    /// cancelling `self` cancels the child.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel the context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` if it is still live.
    ///
    /// Explicit cancellation wins over a passed deadline.
    pub fn err(&self) -> Option<CancelError> {
        if self.token.is_cancelled() {
            return Some(CancelError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> CancelError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => CancelError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CancelError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CancelError::Cancelled
            }
        }
    }
}

impl From<CancellationToken> for CancelContext {
    fn from(token: CancellationToken) -> Self {
        Self::from_token(token)
    }
}
