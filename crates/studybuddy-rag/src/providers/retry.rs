//! Bounded timeout and retry with exponential backoff for provider calls

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Retry policy shared by the HTTP providers
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further retry
    pub base_delay: Duration,
    /// Time budget for a single attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Build the policy from LLM settings
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds, fails permanently, or retries run out
    pub async fn run<F, Fut, T>(&self, label: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            let outcome = match timeout(self.attempt_timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(format!(
                    "{} exceeded {:?}",
                    label, self.attempt_timeout
                ))),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}
