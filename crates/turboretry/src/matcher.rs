//! Error matchers used to classify failures as retryable or not.
//!
//! Matchers operate on type-erased errors so one [`RetryOptions`] value can
//! be shared across operations with different error types. They inspect the
//! whole `source()` chain, so an error wrapped by another error still
//! matches.
//!
//! [`RetryOptions`]: crate::RetryOptions

use crate::error::chain;
use std::error::Error;
use std::sync::Arc;

/// A predicate over an error. Returns `true` when the error matches.
pub type ErrorMatcher = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Build an [`ErrorMatcher`] from a closure.
pub fn matcher<F>(f: F) -> ErrorMatcher
where
    F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Match errors equal to `target` anywhere in the chain.
///
/// # Examples
///
/// ```rust
/// use turboretry::matcher::err_is;
///
/// #[derive(Debug, PartialEq, thiserror::Error)]
/// #[error("busy")]
/// struct Busy;
///
/// let m = err_is(Busy);
/// assert!(m(&Busy));
/// ```
pub fn err_is<T>(target: T) -> ErrorMatcher
where
    T: Error + PartialEq + Send + Sync + 'static,
{
    matcher(move |err| chain(err).any(|e| e.downcast_ref::<T>() == Some(&target)))
}

/// Match errors equal to any of `targets` anywhere in the chain.
pub fn err_is_any<T, I>(targets: I) -> ErrorMatcher
where
    T: Error + PartialEq + Send + Sync + 'static,
    I: IntoIterator<Item = T>,
{
    let targets: Vec<T> = targets.into_iter().collect();
    matcher(move |err| {
        chain(err).any(|e| {
            e.downcast_ref::<T>()
                .is_some_and(|found| targets.iter().any(|t| t == found))
        })
    })
}

/// Match any error of type `T` anywhere in the chain.
pub fn err_as<T>() -> ErrorMatcher
where
    T: Error + 'static,
{
    matcher(|err| chain(err).any(|e| e.is::<T>()))
}

/// Fold matchers with any-match semantics. An empty list never matches.
pub(crate) fn any_match(matchers: &[ErrorMatcher], err: &(dyn Error + 'static)) -> bool {
    matchers.iter().any(|m| m(err))
}
