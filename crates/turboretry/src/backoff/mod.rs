//! Backoff strategies.
//!
//! A backoff strategy decides how long the retry engine waits between a
//! failed attempt and the next one. This module provides the
//! [`BackoffStrategy`] trait and the built-in strategies.
//!
//! # Key Types
//!
//! - [`BackoffStrategy`] - Core trait, also implemented by closures
//! - [`FixedBackoff`] / [`RandomBackoff`] - Constant delay, optionally jittered
//! - [`ExponentialBackoff`] - Exponential growth with cap and jitter
//! - [`IncrementalBackoff`] - Linear growth with cap and jitter
//! - [`Jittered`] - Adds jitter to any strategy
//!
//! # Examples
//!
//! ```rust
//! use turboretry::backoff::{BackoffStrategy, ExponentialBackoff, FixedBackoff};
//! use std::time::Duration;
//!
//! let err = std::io::Error::other("boom");
//!
//! let exponential = ExponentialBackoff::new(Duration::from_millis(100), 2.0, Duration::ZERO);
//! assert_eq!(exponential.next_delay(&err, 2), Duration::from_millis(200));
//!
//! let jittered = FixedBackoff::new(Duration::from_secs(1)).with_jitter(Duration::from_millis(100));
//! assert!(jittered.next_delay(&err, 1) >= Duration::from_secs(1));
//! ```

mod exponential;
mod incremental;
mod strategy;

pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder};
pub use incremental::IncrementalBackoff;
pub use strategy::{BackoffStrategy, FixedBackoff, Jittered, RandomBackoff};
