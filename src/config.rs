//! Configuration types for fetchpool

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fetch behavior configuration (concurrency, per-attempt timeout, identity)
///
/// Groups settings that govern how requests are admitted and executed.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of fetches in flight at once across the batch (default: 5)
    ///
    /// Must be at least 1. This is a global cap, not a per-host one.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Time budget for a single fetch attempt (default: 10 seconds)
    ///
    /// The budget is per attempt, not per task: with `max_attempts = 3` a
    /// task can occupy up to roughly `3 * timeout_per_attempt` plus the sum
    /// of the backoff delays between attempts.
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout_per_attempt: Duration,

    /// User-Agent header sent by the bundled HTTP fetcher
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_per_attempt: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per URL, first try included (default: 3)
    ///
    /// Must be at least 1; `max_attempts = 1` means one shot, no retry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay fed into the exponential backoff (default: 1 second)
    ///
    /// The delay before retrying attempt `n` is `base_delay * 2^(n-1)`,
    /// clamped to `max_delay`.
    #[serde(default = "default_base_delay", with = "duration_serde")]
    pub base_delay: Duration,

    /// Upper clamp on any single backoff delay (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Add random jitter to delays (default: true)
    ///
    /// Jitter spreads the retries of many concurrently-failing tasks over
    /// time instead of letting them storm the server in lockstep.
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            jitter: true,
        }
    }
}

/// How failed URLs appear in the final report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Keep one outcome per input URL; failures carried as explicit error
    /// markers (default)
    #[default]
    IncludeFailed,
    /// Drop failed URLs from the outcome list; the report's stats still
    /// account for them. Compatibility mode only.
    OmitFailed,
}

/// Main configuration for a batch run
///
/// Fields are organized into logical sub-configs:
/// - [`fetch`](FetchConfig) - concurrency, per-attempt timeout, user agent
/// - [`retry`](RetryConfig) - attempt budget, backoff delays, jitter
///
/// Sub-config fields are flattened for serialization, so the JSON format
/// stays flat (no nesting).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fetch admission and execution settings
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// Retry and backoff settings
    #[serde(flatten)]
    pub retry: RetryConfig,

    /// Failed-URL reporting mode
    #[serde(default)]
    pub error_mode: ErrorMode,
}

impl Config {
    /// Check the configuration for programming-level misuse
    ///
    /// Called by [`BatchRunner::new`](crate::runner::BatchRunner::new) so
    /// that invalid settings fail before any task is scheduled.
    pub fn validate(&self) -> Result<(), Error> {
        if self.fetch.concurrency == 0 {
            return Err(Error::Config {
                message: "concurrency must be at least 1".to_string(),
                key: Some("concurrency".to_string()),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".to_string(),
                key: Some("max_attempts".to_string()),
            });
        }
        if self.fetch.timeout_per_attempt.is_zero() {
            return Err(Error::Config {
                message: "timeout_per_attempt must be non-zero".to_string(),
                key: Some("timeout_per_attempt".to_string()),
            });
        }
        Ok(())
    }
}

fn default_concurrency() -> usize {
    5
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("fetchpool/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (serializes as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fetch.concurrency, 5);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.fetch.timeout_per_attempt, Duration::from_secs(10));
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
        assert_eq!(config.error_mode, ErrorMode::IncludeFailed);
        assert!(config.retry.jitter);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = Config {
            fetch: FetchConfig {
                concurrency: 0,
                ..FetchConfig::default()
            },
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("concurrency")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let config = Config {
            retry: RetryConfig {
                max_attempts: 0,
                ..RetryConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config {
            fetch: FetchConfig {
                timeout_per_attempt: Duration::ZERO,
                ..FetchConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let config = Config {
            retry: RetryConfig {
                base_delay: Duration::from_secs(2),
                max_delay: Duration::from_secs(30),
                ..RetryConfig::default()
            },
            ..Config::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["base_delay"], 2);
        assert_eq!(json["max_delay"], 30);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let json = r#"{"concurrency": 2, "max_attempts": 5}"#;
        let config: Config = serde_json::from_str(json).expect("deserialize failed");
        assert_eq!(config.fetch.concurrency, 2);
        assert_eq!(config.retry.max_attempts, 5);
        // Everything else falls back to defaults
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
        assert_eq!(config.error_mode, ErrorMode::IncludeFailed);
    }

    #[test]
    fn error_mode_round_trips_snake_case() {
        let json = serde_json::to_string(&ErrorMode::OmitFailed).unwrap();
        assert_eq!(json, r#""omit_failed""#);
        let back: ErrorMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorMode::OmitFailed);
    }
}
