//! Example: Retrying a flaky operation
//!
//! This example demonstrates:
//! 1. Retry with exponential backoff and retry logging
//! 2. Restricting retries to specific errors
//! 3. Stopping a retry loop through a cancellation context
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run -p turboretry --example retry_example
//! ```

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::Level;
use turboretry::prelude::*;

#[derive(Debug, Error, PartialEq)]
enum ApiError {
    #[error("connection reset")]
    ConnectionReset,
    #[error("unauthorized")]
    Unauthorized,
}

/// A simulated API that fails the first few times
struct UnreliableApi {
    attempts: Arc<AtomicU32>,
    fail_count: u32,
    failure: fn() -> ApiError,
}

impl UnreliableApi {
    fn new(fail_count: u32, failure: fn() -> ApiError) -> Self {
        Self {
            attempts: Arc::new(AtomicU32::new(0)),
            fail_count,
            failure,
        }
    }

    async fn call(&self) -> Result<String, ApiError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        if attempt < self.fail_count {
            let err = (self.failure)();
            println!("  Attempt {}: FAILED ({})", attempt + 1, err);
            Err(err)
        } else {
            println!("  Attempt {}: SUCCESS", attempt + 1);
            Ok("API response data".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Example 1: Exponential backoff with retry logging
async fn example_exponential() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Exponential Backoff ===\n");

    let options = RetryOptions::builder()
        .max_attempts(4)
        .exponential_backoff(Duration::from_millis(100), Duration::from_secs(1))
        .on_retry_logging(Level::WARN, "calling unreliable API")
        .build();

    let api = UnreliableApi::new(2, || ApiError::ConnectionReset);
    let start = Instant::now();

    let result = get_with_options(
        || {
            let api = &api;
            async move { api.call().await }
        },
        &options,
    )
    .await?;

    println!("\nResult: {}", result);
    println!("Total attempts: {}", api.total_attempts());
    println!("Total time: {:?}", start.elapsed());
    println!("Expected delays: 100ms + 200ms = ~300ms");

    Ok(())
}

/// Example 2: Only retry transient errors
async fn example_retry_for() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Retry Only Connection Errors ===\n");

    let api = UnreliableApi::new(3, || ApiError::Unauthorized);
    let err = get(
        || {
            let api = &api;
            async move { api.call().await }
        },
        |options| {
            options
                .retry_for(ApiError::ConnectionReset)
                .fixed_backoff(Duration::from_millis(10))
        },
    )
    .await
    .unwrap_err();

    println!("\nStopped with: {}", err);
    println!("Limit exceeded: {}", err.is_limit_exceeded());
    println!("Total attempts: {}", api.total_attempts());
    assert_eq!(err.source_error(), Some(&ApiError::Unauthorized));

    Ok(())
}

/// Example 3: A deadline cuts the loop short
async fn example_deadline() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Deadline ===\n");

    let ctx = CancelContext::new().with_timeout(Duration::from_millis(250));
    let api = UnreliableApi::new(u32::MAX, || ApiError::ConnectionReset);
    let start = Instant::now();

    let err = execute_cancellable(
        &ctx,
        || {
            let api = &api;
            async move { api.call().await.map(|_| ()) }
        },
        |options| {
            options
                .unlimited_attempts()
                .fixed_backoff(Duration::from_millis(100))
                .join_cancel_error(true)
        },
    )
    .await
    .unwrap_err();

    println!("\nStopped with: {}", err);
    println!("Deadline exceeded: {}", err.is_deadline_exceeded());
    println!("Last retryable error: {:?}", err.previous());
    println!("Total attempts: {}", api.total_attempts());
    println!("Total time: {:?}", start.elapsed());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("==============================================");
    println!("   TurboRetry: Retry Examples");
    println!("==============================================");

    example_exponential().await?;
    example_retry_for().await?;
    example_deadline().await?;

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}
