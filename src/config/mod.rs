//! Run configuration, read from `.testverdict.toml`.
//!
//! ```toml
//! [ai]
//! enabled = true
//! command = "claude"
//! timeout_seconds = 30
//!
//! [retry]
//! max_attempts = 3
//!
//! [correlation]
//! min_confidence = 0.5
//!
//! [git]
//! history_limit = 10
//! ```
//!
//! Every section and field is optional. Command-line flags override what is
//! loaded here.

mod loader;
pub mod retry;

pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_config, user_config_path,
    CONFIG_FILE_NAME, USER_CONFIG_PATH,
};
pub use retry::{RetryConfig, RetryStrategy};

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestVerdictConfig {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub git: GitConfig,
}

impl TestVerdictConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.correlation.min_confidence) {
            return Err(format!(
                "correlation.min_confidence must be within 0..=1, got {}",
                self.correlation.min_confidence
            ));
        }
        if self.ai.max_concurrent == 0 {
            return Err("ai.max_concurrent must be at least 1".to_string());
        }
        if self.ai.requests_per_second == 0 {
            return Err("ai.requests_per_second must be at least 1".to_string());
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

/// External AI tool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Executable invoked as `<command> <extra_args...> -p <prompt>`
    #[serde(default = "default_ai_command")]
    pub command: String,

    #[serde(default)]
    pub extra_args: Vec<String>,

    #[serde(default = "default_ai_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_ai_command(),
            extra_args: Vec::new(),
            timeout_seconds: default_ai_timeout_seconds(),
            max_concurrent: default_max_concurrent(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Pairs below this correlation confidence are not analyzed.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    /// Commits read per file.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ai_command() -> String {
    "claude".to_string()
}

fn default_ai_timeout_seconds() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    2
}

fn default_requests_per_second() -> u32 {
    5
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_history_limit() -> usize {
    10
}
