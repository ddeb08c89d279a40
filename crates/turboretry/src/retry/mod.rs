//! Async retry drivers.
//!
//! Every function here runs the operation until it succeeds, fails with a
//! non-retryable error, reaches the attempt limit or the cancellation
//! context fires. The `execute*` family is for operations without a result
//! value, the `get*` family returns the value of the successful attempt.
//!
//! Functions without `_with_options` take a closure that configures a fresh
//! [`RetryOptionsBuilder`]; the `_with_options` forms take prebuilt, possibly
//! shared, [`RetryOptions`]. The `_cancellable` forms observe an explicit
//! [`CancelContext`], which takes precedence over one stored in the options.
//!
//! Backoff waits use `tokio::time::sleep` and are raced against the
//! cancellation context, so a run stops promptly when its context fires
//! mid-wait.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let counter = AtomicU32::new(0);
//! let calls = &counter;
//! let value = turboretry::get(
//!     || async move {
//!         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
//!             Err(std::io::Error::other("transient"))
//!         } else {
//!             Ok(42)
//!         }
//!     },
//!     |options| options.max_attempts(5).fixed_backoff(Duration::from_millis(1)),
//! )
//! .await
//! .unwrap();
//!
//! assert_eq!(value, 42);
//! assert_eq!(calls.load(Ordering::SeqCst), 3);
//! # }
//! ```

pub(crate) mod engine;

use crate::cancel::CancelContext;
use crate::error::{CancelError, RetryResult};
use crate::options::{RetryOptions, RetryOptionsBuilder};
use engine::{RetryRun, Step};
use std::error::Error;
use std::future::Future;
use std::time::Duration;

/// Retry `operation` with options configured by `configure`.
///
/// # Examples
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let result = turboretry::execute(
///     || async { Err::<(), _>(std::io::Error::other("down")) },
///     |options| options.max_attempts(2).no_backoff(),
/// )
/// .await;
///
/// assert!(result.unwrap_err().is_limit_exceeded());
/// # }
/// ```
pub async fn execute<F, Fut, E, C>(operation: F, configure: C) -> RetryResult<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Error + 'static,
    C: FnOnce(RetryOptionsBuilder) -> RetryOptionsBuilder,
{
    let options = configure(RetryOptions::builder()).build();
    run(operation, &options, None).await
}

/// Retry `operation` with prebuilt options.
pub async fn execute_with_options<F, Fut, E>(operation: F, options: &RetryOptions) -> RetryResult<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Error + 'static,
{
    run(operation, options, None).await
}

/// Retry `operation` and return the value of the successful attempt.
pub async fn get<F, Fut, T, E, C>(operation: F, configure: C) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
    C: FnOnce(RetryOptionsBuilder) -> RetryOptionsBuilder,
{
    let options = configure(RetryOptions::builder()).build();
    run(operation, &options, None).await
}

/// Retry `operation` with prebuilt options and return its value.
pub async fn get_with_options<F, Fut, T, E>(operation: F, options: &RetryOptions) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    run(operation, options, None).await
}

/// [`execute`], stopping once `ctx` is cancelled or expired.
pub async fn execute_cancellable<F, Fut, E, C>(
    ctx: &CancelContext,
    operation: F,
    configure: C,
) -> RetryResult<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Error + 'static,
    C: FnOnce(RetryOptionsBuilder) -> RetryOptionsBuilder,
{
    let options = configure(RetryOptions::builder()).build();
    run(operation, &options, Some(ctx)).await
}

/// [`execute_with_options`], stopping once `ctx` is cancelled or expired.
pub async fn execute_with_options_cancellable<F, Fut, E>(
    ctx: &CancelContext,
    operation: F,
    options: &RetryOptions,
) -> RetryResult<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Error + 'static,
{
    run(operation, options, Some(ctx)).await
}

/// [`get`], stopping once `ctx` is cancelled or expired.
pub async fn get_cancellable<F, Fut, T, E, C>(
    ctx: &CancelContext,
    operation: F,
    configure: C,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
    C: FnOnce(RetryOptionsBuilder) -> RetryOptionsBuilder,
{
    let options = configure(RetryOptions::builder()).build();
    run(operation, &options, Some(ctx)).await
}

/// [`get_with_options`], stopping once `ctx` is cancelled or expired.
pub async fn get_with_options_cancellable<F, Fut, T, E>(
    ctx: &CancelContext,
    operation: F,
    options: &RetryOptions,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    run(operation, options, Some(ctx)).await
}

async fn run<F, Fut, T, E>(
    mut operation: F,
    options: &RetryOptions,
    context: Option<&CancelContext>,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    let mut run = RetryRun::new(options, context);
    loop {
        run.check_cancel()?;
        run.begin_attempt();

        let error = match operation().await {
            Ok(value) => {
                run.succeeded();
                return Ok(value);
            }
            Err(error) => error,
        };

        let (error, delay) = match run.on_failure(error) {
            Step::Retry { error, delay } => (error, delay),
            Step::Stop(err) => return Err(err),
        };

        if let Some(delay) = delay.filter(|d| !d.is_zero()) {
            if let Err(reason) = wait(delay, run.context()).await {
                return Err(run.interrupted(error, reason));
            }
        }

        run.after_backoff(error);
    }
}

/// Sleep for `delay`, or until `ctx` fires. The timer is dropped on both
/// paths.
async fn wait(delay: Duration, ctx: Option<&CancelContext>) -> Result<(), CancelError> {
    match ctx {
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
        Some(ctx) => tokio::select! {
            biased;
            reason = ctx.done() => Err(reason),
            _ = tokio::time::sleep(delay) => Ok(()),
        },
    }
}
