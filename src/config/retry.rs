//! Retry configuration for calls that cross a process boundary.
//!
//! ```toml
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//! strategy = "exponential"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, the first call included (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds (default: 1000)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Upper bound on any single delay in milliseconds (default: 30000)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            strategy: RetryStrategy::default(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Delay before retry number `attempt` (1-indexed: the first retry is 1).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay_ms as f64;
        let delay_ms = match self.strategy {
            RetryStrategy::Constant => base_ms,
            RetryStrategy::Linear => base_ms * attempt as f64,
            RetryStrategy::Exponential => base_ms * 2.0_f64.powi(attempt.saturating_sub(1) as i32),
        };
        Duration::from_millis(delay_ms.min(self.max_delay_ms as f64) as u64)
    }

    /// Whether another attempt is allowed after `attempts_made` calls.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    Constant,
    Linear,
    /// Delay doubles each attempt: base * 2^(attempt-1).
    #[default]
    Exponential,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.strategy, RetryStrategy::Exponential);
    }

    #[test]
    fn test_exponential_strategy_delay() {
        let config = RetryConfig {
            base_delay_ms: 100,
            ..Default::default()
        };
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_linear_and_constant_delay() {
        let linear = RetryConfig {
            strategy: RetryStrategy::Linear,
            base_delay_ms: 100,
            ..Default::default()
        };
        assert_eq!(linear.delay_for_attempt(3), Duration::from_millis(300));

        let constant = RetryConfig {
            strategy: RetryStrategy::Constant,
            base_delay_ms: 100,
            ..Default::default()
        };
        assert_eq!(constant.delay_for_attempt(3), Duration::from_millis(100));
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig {
            base_delay_ms: 10_000,
            max_delay_ms: 15_000,
            ..Default::default()
        };
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(15_000));
    }

    #[test]
    fn test_should_retry() {
        let config = RetryConfig::default();
        assert!(config.should_retry(1));
        assert!(config.should_retry(2));
        assert!(!config.should_retry(3));
        assert!(!RetryConfig::disabled().should_retry(1));
    }

    #[test]
    fn test_toml_round_trip() {
        let config: RetryConfig = toml::from_str("max_attempts = 5\nstrategy = \"linear\"").unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.strategy, RetryStrategy::Linear);
        assert_eq!(config.base_delay_ms, 1000);
    }
}
