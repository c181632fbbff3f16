use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: String,
}

/// Fixed count, fixed delay. The delay is slept before every attempt,
/// including the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `attempt` (called with the 1-based attempt number) until it succeeds
    /// or the attempts are used up.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut last_error = None;

        for number in 1..=self.max_attempts {
            tokio::time::sleep(self.delay).await;

            match attempt(number).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed: {:#}",
                        number,
                        self.max_attempts,
                        e
                    );
                    last_error = Some(format!("{e:#}"));
                }
            }
        }

        Err(RetryExhausted {
            attempts: self.max_attempts,
            last_error: last_error.unwrap_or_else(|| "no attempt was made".to_string()),
        })
    }
}

/// Bounded polling for a freshly created resource to become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            attempts: 20,
            interval: Duration::from_secs(1),
        }
    }
}

impl WaitPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// `Ok(true)` as soon as `probe` reports the resource, `Ok(false)` once
    /// every check has come back negative.
    pub async fn until<F, Fut>(&self, mut probe: F) -> anyhow::Result<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        for check in 1..=self.attempts {
            if probe().await? {
                return Ok(true);
            }
            tracing::debug!("Not visible yet ({}/{})", check, self.attempts);
            if check < self.attempts {
                tokio::time::sleep(self.interval).await;
            }
        }
        Ok(false)
    }
}
