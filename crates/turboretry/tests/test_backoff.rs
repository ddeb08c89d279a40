//! Backoff timing tests
//!
//! These run on the real clock and check the total time a failing run spends
//! waiting between attempts.

mod common;

use common::{Calls, TestError};
use std::time::{Duration, Instant};
use turboretry::backoff::IncrementalBackoff;
use turboretry::RetryOptionsBuilder;

async fn elapsed_for<C>(configure: C) -> (Duration, u32)
where
    C: FnOnce(RetryOptionsBuilder) -> RetryOptionsBuilder,
{
    let calls = Calls::new();
    let start = Instant::now();

    let result = turboretry::execute(
        || {
            let calls = calls.clone();
            async move {
                calls.hit();
                Err::<(), _>(TestError::Transient)
            }
        },
        configure,
    )
    .await;

    assert!(result.unwrap_err().is_limit_exceeded());
    (start.elapsed(), calls.count())
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[tokio::test]
async fn test_fixed_backoff_total_wait() {
    let (elapsed, calls) =
        elapsed_for(|options| options.max_attempts(11).fixed_backoff(ms(200))).await;

    assert_eq!(calls, 11);
    assert!(elapsed > ms(2000), "elapsed {:?}", elapsed);
    assert!(elapsed < ms(2100), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_exponential_backoff_total_wait() {
    // 200 + 400 + 800
    let (elapsed, calls) = elapsed_for(|options| {
        options
            .max_attempts(4)
            .exponential_backoff(ms(200), Duration::ZERO)
    })
    .await;

    assert_eq!(calls, 4);
    assert!(elapsed > ms(1400), "elapsed {:?}", elapsed);
    assert!(elapsed < ms(1500), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_uncapped_exponential_random_backoff_is_exact() {
    // Without a cap the jitter is not applied: 200 + 400 + 800
    let (elapsed, calls) = elapsed_for(|options| {
        options
            .max_attempts(4)
            .exponential_random_backoff(ms(200), Duration::ZERO)
    })
    .await;

    assert_eq!(calls, 4);
    assert!(elapsed > ms(1400), "elapsed {:?}", elapsed);
    assert!(elapsed < ms(1500), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_incremental_backoff_total_wait() {
    // 200 + 400 + 600 + 800
    let (elapsed, calls) = elapsed_for(|options| {
        options
            .max_attempts(5)
            .backoff(IncrementalBackoff::new(ms(200), ms(200), Duration::ZERO))
    })
    .await;

    assert_eq!(calls, 5);
    assert!(elapsed > ms(2000), "elapsed {:?}", elapsed);
    assert!(elapsed < ms(2100), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_exponential_backoff_respects_cap() {
    // 100 + 150 + 150
    let (elapsed, _) = elapsed_for(|options| {
        options
            .max_attempts(4)
            .exponential_backoff(ms(100), ms(150))
    })
    .await;

    assert!(elapsed >= ms(400), "elapsed {:?}", elapsed);
    assert!(elapsed < ms(500), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_random_backoff_stays_within_jitter() {
    // Three waits of 100ms plus up to 50ms each.
    let (elapsed, _) =
        elapsed_for(|options| options.max_attempts(4).random_backoff(ms(100))).await;

    assert!(elapsed >= ms(300), "elapsed {:?}", elapsed);
    assert!(elapsed < ms(500), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_no_backoff_retries_immediately() {
    let (elapsed, calls) = elapsed_for(|options| options.max_attempts(50).no_backoff()).await;

    assert_eq!(calls, 50);
    assert!(elapsed < ms(100), "elapsed {:?}", elapsed);
}
