//! Attempt counting tests
//!
//! - Exact invocation counts for bounded runs
//! - Single attempt runs never back off or notify
//! - Unlimited runs
//! - Retry handlers and value-returning runs

mod common;

use common::{Calls, TestError};
use rstest::*;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use turboretry::{RetryError, RetryOptions};

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
#[case(10)]
#[tokio::test]
async fn test_always_failing_operation_runs_max_attempts(#[case] max: u32) {
    let calls = Calls::new();

    let result = turboretry::execute(
        || {
            let calls = calls.clone();
            async move {
                calls.hit();
                Err::<(), _>(TestError::Transient)
            }
        },
        |options| options.max_attempts(max).no_backoff(),
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.is_limit_exceeded());
    assert_eq!(err.attempts(), max);
    assert_eq!(err.source_error(), Some(&TestError::Transient));
    assert_eq!(calls.count(), max);
}

#[tokio::test]
async fn test_single_attempt_skips_backoff_and_handlers() {
    let calls = Calls::new();
    let consulted = Calls::new();
    let notified = Calls::new();
    let consulted_clone = consulted.clone();
    let notified_clone = notified.clone();

    let result = turboretry::execute(
        || {
            let calls = calls.clone();
            async move {
                calls.hit();
                Err::<(), _>(TestError::Transient)
            }
        },
        |options| {
            options
                .max_attempts(1)
                .backoff(move |_: &(dyn Error + 'static), _: u32| {
                    consulted_clone.hit();
                    Duration::from_secs(10)
                })
                .on_retry(move |_, _| {
                    notified_clone.hit();
                })
        },
    )
    .await;

    assert!(result.unwrap_err().is_limit_exceeded());
    assert_eq!(calls.count(), 1);
    assert_eq!(consulted.count(), 0);
    assert_eq!(notified.count(), 0);
}

#[tokio::test]
async fn test_unlimited_attempts_until_success() {
    let calls = Calls::new();
    let start = Instant::now();

    let result = turboretry::execute(
        || {
            let calls = calls.clone();
            async move {
                if calls.hit() <= 1000 {
                    Err(TestError::Transient)
                } else {
                    Ok(())
                }
            }
        },
        |options| options.unlimited_attempts().no_backoff(),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(calls.count(), 1001);
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn test_get_returns_value_of_successful_attempt() {
    let calls = Calls::new();

    let value = turboretry::get(
        || {
            let calls = calls.clone();
            async move {
                let n = calls.hit();
                if n < 3 {
                    Err(TestError::Transient)
                } else {
                    Ok(format!("attempt {}", n))
                }
            }
        },
        |options| options.no_backoff(),
    )
    .await
    .unwrap();

    assert_eq!(value, "attempt 3");
}

#[tokio::test]
async fn test_get_failure_carries_attempt_count() {
    let err = turboretry::get(
        || async { Err::<String, _>(TestError::Transient) },
        |options| options.max_attempts(3).no_backoff(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RetryError::LimitExceeded { attempts: 3, .. }));
}

#[tokio::test]
async fn test_handlers_called_in_order_for_each_retry() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&seen);
    let second = Arc::clone(&seen);

    let options = RetryOptions::builder()
        .max_attempts(4)
        .no_backoff()
        .on_retry(move |err, attempt| {
            first.lock().unwrap().push(format!("first {} {}", attempt, err));
        })
        .on_retry(move |_, attempt| {
            second.lock().unwrap().push(format!("second {}", attempt));
        })
        .build();

    let _ = turboretry::execute_with_options(
        || async { Err::<(), _>(TestError::Transient) },
        &options,
    )
    .await;

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            "first 1 transient failure",
            "second 1",
            "first 2 transient failure",
            "second 2",
            "first 3 transient failure",
            "second 3",
        ]
    );
}

#[tokio::test]
async fn test_logging_handler_emits_without_failing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let result = turboretry::execute(
        || async { Err::<(), _>(TestError::Transient) },
        |options| {
            options
                .max_attempts(7)
                .no_backoff()
                .on_retry_logging(tracing::Level::INFO, "retrying test operation")
        },
    )
    .await;

    assert_eq!(result.unwrap_err().attempts(), 7);
}

#[test]
fn test_blocking_get_matches_async_semantics() {
    let calls = Calls::new();

    let value = turboretry::blocking::get(
        || {
            if calls.hit() < 4 {
                Err(TestError::Transient)
            } else {
                Ok(calls.count())
            }
        },
        |options| options.max_attempts(4).fixed_backoff(Duration::from_millis(1)),
    )
    .unwrap();

    assert_eq!(value, 4);
}
