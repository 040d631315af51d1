use log::error;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::app_config::RetrySettings;

/// Sequential retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included
    pub max_attempts: u32,

    /// Delay after the first failure; doubled after each further failure
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            backoff_base: Duration::from_millis(settings.backoff_base_ms),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts,
            backoff_base,
        }
    }

    /// Delay slept after the given 0-based attempt fails
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(1u32 << attempt.min(16))
    }

    /// Run `operation` until it succeeds or the attempts are used up
    ///
    /// The closure receives the 0-based attempt number. The last error is
    /// returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    error!("{} failed: {} - attempt {}/{}", label, e, attempt + 1, attempts);

                    if attempt + 1 >= attempts {
                        return Err(e);
                    }

                    tokio::time::sleep(self.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
