//! [`AiBridge`] backed by an external command-line tool.
//!
//! Every request goes through three gates: a semaphore bounding in-flight
//! processes, a token-bucket rate limiter, and a per-attempt timeout. Failed
//! attempts are retried with the configured backoff unless the tool is not
//! installed.

use super::AiBridge;
use crate::config::{AiConfig, RetryConfig};
use crate::errors::AiError;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{OnceCell, Semaphore};
use tracing::{debug, warn};

pub struct CliAiBridge {
    command: String,
    extra_args: Vec<String>,
    timeout: Duration,
    retry: RetryConfig,
    in_flight: Semaphore,
    limiter: DefaultDirectRateLimiter,
    available: OnceCell<bool>,
}

impl CliAiBridge {
    pub fn new(config: &AiConfig, retry: RetryConfig) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            command: config.command.clone(),
            extra_args: config.extra_args.clone(),
            timeout: config.timeout(),
            retry,
            in_flight: Semaphore::new(config.max_concurrent.max(1)),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            available: OnceCell::new(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    async fn ask_once(&self, prompt: &str) -> Result<String, AiError> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| AiError::Process {
                message: e.to_string(),
            })?;
        self.limiter.until_ready().await;

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.extra_args)
            .arg("-p")
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => return Err(AiError::Timeout { after: self.timeout }),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AiError::NotInstalled {
                    command: self.command.clone(),
                })
            }
            Ok(Err(e)) => {
                return Err(AiError::Process {
                    message: e.to_string(),
                })
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AiError::Process {
                message: format!("{} exited with {}: {}", self.command, output.status, stderr.trim()),
            });
        }

        let reply = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if reply.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(reply)
    }
}

#[async_trait]
impl AiBridge for CliAiBridge {
    async fn ask(&self, prompt: &str) -> Result<String, AiError> {
        let mut attempt = 1;
        loop {
            match self.ask_once(prompt).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_retryable() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "AI request failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn check_availability(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                let found = which::which(&self.command).is_ok();
                if !found {
                    warn!("AI tool '{}' not found on PATH; AI analysis disabled", self.command);
                }
                found
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge_for(command: &str, retry: RetryConfig) -> CliAiBridge {
        let config = AiConfig {
            command: command.to_string(),
            timeout_seconds: 5,
            ..Default::default()
        };
        CliAiBridge::new(&config, retry)
    }

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        let bridge = bridge_for("testverdict-no-such-ai-tool", RetryConfig::default());
        assert!(!bridge.check_availability().await);
    }

    #[tokio::test]
    async fn test_missing_tool_is_not_retried() {
        // A retry would sleep for the full base delay; a prompt answer proves
        // the first NotInstalled ended the loop.
        let retry = RetryConfig {
            base_delay_ms: 60_000,
            ..Default::default()
        };
        let bridge = bridge_for("testverdict-no-such-ai-tool", retry);
        let started = std::time::Instant::now();
        let err = bridge.ask("hello").await.unwrap_err();
        assert!(matches!(err, AiError::NotInstalled { .. }));
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reply_is_stdout() {
        // `echo -p <prompt>` prints its arguments back.
        let bridge = bridge_for("echo", RetryConfig::disabled());
        let reply = bridge.ask("hello").await.unwrap();
        assert_eq!(reply, "-p hello");
    }
}
