//! Shared options tests
//!
//! One [`RetryOptions`] value reused by concurrent runs and per-run
//! overrides layered on top of it.

mod common;

use common::{Calls, TestError};
use std::sync::Arc;
use turboretry::config::RetryConfig;
use turboretry::RetryOptions;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_with_different_overrides() {
    let shared = Arc::new(RetryOptions::builder().max_attempts(5).no_backoff().build());

    let mut handles = Vec::new();
    for run in 0..16u32 {
        let shared = Arc::clone(&shared);
        let limit = run % 4 + 1;
        handles.push(tokio::spawn(async move {
            let calls = Calls::new();
            let result = turboretry::execute(
                || {
                    let calls = calls.clone();
                    async move {
                        calls.hit();
                        tokio::task::yield_now().await;
                        Err::<(), _>(TestError::Transient)
                    }
                },
                |options| options.copy_from(&shared).max_attempts(limit),
            )
            .await;
            (limit, result.unwrap_err().attempts(), calls.count())
        }));
    }

    for handle in handles {
        let (limit, attempts, calls) = handle.await.unwrap();
        assert_eq!(attempts, limit);
        assert_eq!(calls, limit);
    }
    assert_eq!(shared.max_attempts(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_share_options() {
    let options = Arc::new(RetryOptions::builder().max_attempts(3).no_backoff().build());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let options = Arc::clone(&options);
        handles.push(tokio::spawn(async move {
            let calls = Calls::new();
            let result = turboretry::execute_with_options(
                || {
                    let calls = calls.clone();
                    async move {
                        calls.hit();
                        tokio::task::yield_now().await;
                        Err::<(), _>(TestError::Transient)
                    }
                },
                &options,
            )
            .await;
            (result.unwrap_err().attempts(), calls.count())
        }));
    }

    for handle in handles {
        let (attempts, calls) = handle.await.unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(calls, 3);
    }
    assert_eq!(options.max_attempts(), 3);
}

#[tokio::test]
async fn test_options_from_config_drive_a_run() {
    let options = RetryOptions::try_from(
        RetryConfig::from_json_str(
            r#"{"max_attempts": 4, "backoff": {"kind": "fixed", "delay_ms": 1}}"#,
        )
        .unwrap(),
    )
    .unwrap();
    let calls = Calls::new();

    let result = turboretry::execute_with_options(
        || {
            let calls = calls.clone();
            async move {
                calls.hit();
                Err::<(), _>(TestError::Transient)
            }
        },
        &options,
    )
    .await;

    assert!(result.unwrap_err().is_limit_exceeded());
    assert_eq!(calls.count(), 4);
}
