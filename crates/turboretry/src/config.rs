//! Declarative retry configuration.
//!
//! [`RetryConfig`] is the serde-friendly counterpart of
//! [`RetryOptions`](crate::RetryOptions): plain data that can live in a
//! config file next to the rest of an application's settings. Matchers,
//! handlers and cancellation contexts are code, not data, so they are added
//! on the builder returned by [`RetryConfig::to_builder`].
//!
//! Durations are expressed in milliseconds.
//!
//! # Examples
//!
//! ```rust
//! use turboretry::config::RetryConfig;
//!
//! let config = RetryConfig::from_json_str(r#"{
//!     "max_attempts": 4,
//!     "backoff": { "kind": "exponential", "initial_ms": 100, "max_ms": 5000 }
//! }"#).unwrap();
//!
//! let options = config.into_options().unwrap();
//! assert_eq!(options.max_attempts(), 4);
//! ```

use crate::backoff::{
    BackoffStrategy, ExponentialBackoff, FixedBackoff, IncrementalBackoff, RandomBackoff,
};
use crate::options::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MULTIPLIER, RetryOptions, RetryOptionsBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading a [`RetryConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The input was not valid JSON for a retry config.
    #[error("Failed to parse retry config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The config parsed but holds an unusable value.
    #[error("Invalid retry config: {0}")]
    Invalid(String),
}

/// Result type alias for config loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Serializable retry configuration.
///
/// Missing fields take the same defaults as [`RetryOptions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum attempts, `0` for unlimited.
    pub max_attempts: u32,

    /// Wait between attempts.
    pub backoff: BackoffConfig,

    /// Join the last retryable error into cancellation errors.
    pub join_cancel_error: bool,

    /// Allow cancellation errors returned by the operation to be retried.
    pub retry_on_cancel_error: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffConfig::default(),
            join_cancel_error: false,
            retry_on_cancel_error: false,
        }
    }
}

/// Serializable backoff selection, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffConfig {
    /// Retry immediately.
    None,

    /// Constant delay.
    Fixed {
        /// Delay between attempts.
        delay_ms: u64,
    },

    /// Constant delay plus random jitter.
    Random {
        /// Base delay between attempts.
        delay_ms: u64,
        /// Jitter bound, half of `delay_ms` when omitted.
        #[serde(default)]
        jitter_ms: Option<u64>,
    },

    /// Exponential growth, capped at `max_ms` when non-zero.
    Exponential {
        /// Delay after the first failure.
        initial_ms: u64,
        /// Growth factor, 2.0 when omitted.
        #[serde(default = "default_multiplier")]
        multiplier: f64,
        /// Cap, `0` for none.
        #[serde(default)]
        max_ms: u64,
        /// Jitter bound, `0` for none. Ignored without a cap.
        #[serde(default)]
        jitter_ms: u64,
    },

    /// Linear growth, capped at `max_ms` when non-zero.
    Incremental {
        /// Delay after the first failure.
        initial_ms: u64,
        /// Added per attempt.
        increment_ms: u64,
        /// Cap, `0` for none.
        #[serde(default)]
        max_ms: u64,
        /// Jitter bound, `0` for none. Ignored without a cap.
        #[serde(default)]
        jitter_ms: u64,
    },
}

fn default_multiplier() -> f64 {
    DEFAULT_MULTIPLIER
}

impl Default for BackoffConfig {
    /// 200ms with up to 100ms of jitter, the [`RetryOptions`] default.
    fn default() -> Self {
        Self::Random {
            delay_ms: 200,
            jitter_ms: Some(100),
        }
    }
}

impl BackoffConfig {
    /// Build the strategy, `None` for [`BackoffConfig::None`].
    pub fn strategy(&self) -> Option<Arc<dyn BackoffStrategy>> {
        let ms = Duration::from_millis;
        let strategy: Arc<dyn BackoffStrategy> = match *self {
            Self::None => return None,
            Self::Fixed { delay_ms } => Arc::new(FixedBackoff::new(ms(delay_ms))),
            Self::Random {
                delay_ms,
                jitter_ms,
            } => Arc::new(RandomBackoff::random(
                ms(delay_ms),
                ms(jitter_ms.unwrap_or(delay_ms / 2)),
            )),
            Self::Exponential {
                initial_ms,
                multiplier,
                max_ms,
                jitter_ms,
            } => Arc::new(ExponentialBackoff::randomized(
                ms(initial_ms),
                multiplier,
                ms(max_ms),
                ms(jitter_ms),
            )),
            Self::Incremental {
                initial_ms,
                increment_ms,
                max_ms,
                jitter_ms,
            } => Arc::new(IncrementalBackoff::randomized(
                ms(initial_ms),
                ms(increment_ms),
                ms(max_ms),
                ms(jitter_ms),
            )),
        };
        Some(strategy)
    }
}

impl RetryConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject values that cannot produce sensible options.
    pub fn validate(&self) -> Result<()> {
        if let BackoffConfig::Exponential { multiplier, .. } = self.backoff {
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(ConfigError::Invalid(format!(
                    "exponential multiplier must be a finite number >= 1.0, got {}",
                    multiplier
                )));
            }
        }
        Ok(())
    }

    /// A builder preloaded with this configuration.
    ///
    /// Runs [`validate`](Self::validate) first, so a config deserialized
    /// from any format is checked before it is used.
    pub fn to_builder(&self) -> Result<RetryOptionsBuilder> {
        self.validate()?;
        let builder = RetryOptions::builder()
            .max_attempts(self.max_attempts)
            .join_cancel_error(self.join_cancel_error)
            .retry_on_cancel_error(self.retry_on_cancel_error);

        Ok(match self.backoff.strategy() {
            Some(strategy) => builder.shared_backoff(strategy),
            None => builder.no_backoff(),
        })
    }

    /// Validate and convert into options.
    pub fn into_options(self) -> Result<RetryOptions> {
        Ok(self.to_builder()?.build())
    }
}

impl TryFrom<RetryConfig> for RetryOptions {
    type Error = ConfigError;

    fn try_from(config: RetryConfig) -> Result<Self> {
        config.into_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err() -> std::io::Error {
        std::io::Error::other("failed")
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RetryConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RetryConfig::default());

        let options = config.into_options().unwrap();
        assert_eq!(options.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert!(options.has_backoff());
    }

    #[test]
    fn test_fixed_backoff_from_json() {
        let config = RetryConfig::from_json_str(
            r#"{"max_attempts": 0, "backoff": {"kind": "fixed", "delay_ms": 250}}"#,
        )
        .unwrap();

        let options = config.into_options().unwrap();
        assert_eq!(options.max_attempts(), 0);
        assert_eq!(options.backoff_delay(&err(), 7), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_none_disables_backoff() {
        let config = RetryConfig::from_json_str(r#"{"backoff": {"kind": "none"}}"#).unwrap();
        assert!(!config.into_options().unwrap().has_backoff());
    }

    #[test]
    fn test_exponential_defaults_multiplier() {
        let config = RetryConfig::from_json_str(
            r#"{"backoff": {"kind": "exponential", "initial_ms": 100}}"#,
        )
        .unwrap();

        let options = config.into_options().unwrap();
        assert_eq!(options.backoff_delay(&err(), 3), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_invalid_multiplier_rejected() {
        let result = RetryConfig::from_json_str(
            r#"{"backoff": {"kind": "exponential", "initial_ms": 100, "multiplier": 0.5}}"#,
        );

        match result {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("multiplier")),
            other => panic!("Expected Invalid error, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialized_config_validated_on_conversion() {
        let config: RetryConfig = toml::from_str(
            r#"
            [backoff]
            kind = "exponential"
            initial_ms = 100
            multiplier = 0.5
            "#,
        )
        .unwrap();

        assert!(matches!(config.to_builder(), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            RetryOptions::try_from(config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = RetryConfig::from_json_str(r#"{"max_retries": 3}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_json_roundtrip_preserves_kind() {
        let config = RetryConfig {
            max_attempts: 7,
            backoff: BackoffConfig::Incremental {
                initial_ms: 100,
                increment_ms: 50,
                max_ms: 1000,
                jitter_ms: 0,
            },
            join_cancel_error: true,
            retry_on_cancel_error: false,
        };

        let json = config.to_json_string().unwrap();
        assert!(json.contains(r#""kind":"incremental""#));
        assert_eq!(RetryConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_from_toml() {
        let config: RetryConfig = toml::from_str(
            r#"
            max_attempts = 3
            join_cancel_error = true

            [backoff]
            kind = "random"
            delay_ms = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.max_attempts, 3);
        assert!(config.join_cancel_error);
        assert_eq!(
            config.backoff,
            BackoffConfig::Random {
                delay_ms: 100,
                jitter_ms: None
            }
        );

        let options = RetryOptions::try_from(config).unwrap();
        let delay = options.backoff_delay(&err(), 1).unwrap();
        assert!(delay >= Duration::from_millis(100) && delay < Duration::from_millis(150));
    }
}
