#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry execution for fallible operations.
//!
//! This crate runs an operation repeatedly until it succeeds, fails with a
//! non-retryable error, reaches an attempt limit or an external cancellation
//! context fires. It provides:
//!
//! - **An attempt loop** for async ([`execute`], [`get`]) and blocking
//!   ([`blocking`]) operations
//! - **Error classification** via chain-aware matchers ([`matcher`])
//! - **Pluggable backoff** via the [`BackoffStrategy`](backoff::BackoffStrategy)
//!   trait
//!   - Fixed, random, exponential and incremental strategies
//!   - Jitter that respects caps
//! - **Cancellation** via [`CancelContext`] (explicit cancel plus deadline)
//! - **Structured errors** via [`RetryError`], inspectable without string
//!   comparison
//!
//! # Attempt semantics
//!
//! - `max_attempts(0)`: unlimited
//! - `max_attempts(1)`: a single attempt, no backoff, no retry handler
//! - `max_attempts(n)`: up to `n` invocations
//!
//! Errors carrying a [`CancelError`] in their source chain are not retried
//! unless `retry_on_cancel_error(true)` is set.
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use turboretry::prelude::*;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = RetryOptions::builder()
//!     .max_attempts(3)
//!     .exponential_backoff(Duration::from_millis(10), Duration::from_secs(1))
//!     .on_retry_logging(tracing::Level::WARN, "retrying request")
//!     .build();
//!
//! let value = get_with_options(|| async { Ok::<_, std::io::Error>(42) }, &options).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```
//!
//! Telling failures apart:
//!
//! ```rust
//! use turboretry::{CancelContext, RetryError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ctx = CancelContext::new();
//! ctx.cancel();
//!
//! let err = turboretry::execute_cancellable(
//!     &ctx,
//!     || async { Err::<(), _>(std::io::Error::other("unreachable")) },
//!     |options| options,
//! )
//! .await
//! .unwrap_err();
//!
//! assert!(err.is_cancelled());
//! assert!(!err.is_limit_exceeded());
//! assert!(matches!(err, RetryError::Cancelled { attempts: 0, .. }));
//! # }
//! ```

pub mod backoff;
pub mod blocking;
pub mod cancel;
pub mod config;
pub mod error;
pub mod matcher;
pub mod options;
mod retry;

pub use cancel::CancelContext;
pub use error::{CancelError, RetryError, RetryResult};
pub use options::{
    DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS, DEFAULT_MULTIPLIER, MAX_BACKOFF, RetryHandler,
    RetryOptions, RetryOptionsBuilder,
};
pub use retry::{
    execute, execute_cancellable, execute_with_options, execute_with_options_cancellable, get,
    get_cancellable, get_with_options, get_with_options_cancellable,
};

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use turboretry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backoff::{
        BackoffStrategy, ExponentialBackoff, FixedBackoff, IncrementalBackoff, RandomBackoff,
    };
    pub use crate::cancel::CancelContext;
    pub use crate::error::{CancelError, RetryError, RetryResult};
    pub use crate::matcher::{err_as, err_is};
    pub use crate::options::{RetryOptions, RetryOptionsBuilder};
    pub use crate::retry::{
        execute, execute_cancellable, execute_with_options, execute_with_options_cancellable, get,
        get_cancellable, get_with_options, get_with_options_cancellable,
    };
}
