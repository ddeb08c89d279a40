//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;
use turboretry::CancelError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TestError {
    #[error("transient failure")]
    Transient,
    #[error("fatal failure")]
    Fatal,
    #[error("operation interrupted")]
    Interrupted(#[from] CancelError),
}

/// An error that wraps a [`TestError`] as its source.
#[derive(Debug, Error)]
#[error("request failed")]
pub struct RequestError {
    #[source]
    pub inner: TestError,
}

/// Invocation counter shared between a test and its operation.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicU32>);

impl Calls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call and return its 1-based number.
    pub fn hit(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}
