//! Blocking retry drivers for synchronous operations.
//!
//! Same semantics as the async functions at the crate root, but the
//! operation is a plain closure and backoff waits block the current thread
//! with [`std::thread::sleep`]. No tokio runtime is required.
//!
//! The cancellation context is polled before every attempt only; a wait that
//! is already in progress is not interrupted.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//!
//! let mut calls = 0;
//! let value = turboretry::blocking::get(
//!     || {
//!         calls += 1;
//!         if calls < 3 { Err(std::fmt::Error) } else { Ok(calls) }
//!     },
//!     |options| options.fixed_backoff(Duration::from_millis(1)),
//! )
//! .unwrap();
//!
//! assert_eq!(value, 3);
//! ```

use crate::cancel::CancelContext;
use crate::error::RetryResult;
use crate::options::{RetryOptions, RetryOptionsBuilder};
use crate::retry::engine::{RetryRun, Step};
use std::error::Error;

/// Blocking form of [`execute`](crate::execute).
pub fn execute<F, E, C>(operation: F, configure: C) -> RetryResult<(), E>
where
    F: FnMut() -> Result<(), E>,
    E: Error + 'static,
    C: FnOnce(RetryOptionsBuilder) -> RetryOptionsBuilder,
{
    let options = configure(RetryOptions::builder()).build();
    run(operation, &options, None)
}

/// Blocking form of [`execute_with_options`](crate::execute_with_options).
pub fn execute_with_options<F, E>(operation: F, options: &RetryOptions) -> RetryResult<(), E>
where
    F: FnMut() -> Result<(), E>,
    E: Error + 'static,
{
    run(operation, options, None)
}

/// Blocking form of [`get`](crate::get).
pub fn get<F, T, E, C>(operation: F, configure: C) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
    C: FnOnce(RetryOptionsBuilder) -> RetryOptionsBuilder,
{
    let options = configure(RetryOptions::builder()).build();
    run(operation, &options, None)
}

/// Blocking form of [`get_with_options`](crate::get_with_options).
pub fn get_with_options<F, T, E>(operation: F, options: &RetryOptions) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
{
    run(operation, options, None)
}

/// Blocking form of [`execute_cancellable`](crate::execute_cancellable).
pub fn execute_cancellable<F, E, C>(
    ctx: &CancelContext,
    operation: F,
    configure: C,
) -> RetryResult<(), E>
where
    F: FnMut() -> Result<(), E>,
    E: Error + 'static,
    C: FnOnce(RetryOptionsBuilder) -> RetryOptionsBuilder,
{
    let options = configure(RetryOptions::builder()).build();
    run(operation, &options, Some(ctx))
}

/// Blocking form of
/// [`execute_with_options_cancellable`](crate::execute_with_options_cancellable).
pub fn execute_with_options_cancellable<F, E>(
    ctx: &CancelContext,
    operation: F,
    options: &RetryOptions,
) -> RetryResult<(), E>
where
    F: FnMut() -> Result<(), E>,
    E: Error + 'static,
{
    run(operation, options, Some(ctx))
}

/// Blocking form of [`get_cancellable`](crate::get_cancellable).
pub fn get_cancellable<F, T, E, C>(
    ctx: &CancelContext,
    operation: F,
    configure: C,
) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
    C: FnOnce(RetryOptionsBuilder) -> RetryOptionsBuilder,
{
    let options = configure(RetryOptions::builder()).build();
    run(operation, &options, Some(ctx))
}

/// Blocking form of
/// [`get_with_options_cancellable`](crate::get_with_options_cancellable).
pub fn get_with_options_cancellable<F, T, E>(
    ctx: &CancelContext,
    operation: F,
    options: &RetryOptions,
) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
{
    run(operation, options, Some(ctx))
}

fn run<F, T, E>(
    mut operation: F,
    options: &RetryOptions,
    context: Option<&CancelContext>,
) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
{
    let mut run = RetryRun::new(options, context);
    loop {
        run.check_cancel()?;
        run.begin_attempt();

        let error = match operation() {
            Ok(value) => {
                run.succeeded();
                return Ok(value);
            }
            Err(error) => error,
        };

        match run.on_failure(error) {
            Step::Retry { error, delay } => {
                if let Some(delay) = delay.filter(|d| !d.is_zero()) {
                    std::thread::sleep(delay);
                }
                run.after_backoff(error);
            }
            Step::Stop(err) => return Err(err),
        }
    }
}
