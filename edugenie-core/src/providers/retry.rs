//! Retry policy for resilient provider operations
//!
//! This module implements configurable retry policies with exponential
//! backoff and optional jitter. The chat/continuation path never retries;
//! the quiz generator runs its whole generate-and-parse step through
//! [`RetryExecutor`] to ride out rate limits and flaky model output.

use crate::providers::ProviderError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::warn;

/// Errors that know whether repeating the operation may help
pub trait Retryable {
    /// Whether the operation should be attempted again
    fn is_retryable(&self) -> bool;

    /// Delay requested by the remote side, if any
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        ProviderError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_delay()
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial attempt)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial delay before first retry (milliseconds)
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Base for exponential backoff (e.g., 2.0 for doubling)
    #[serde(default = "default_exponential_base")]
    pub exponential_base: f64,

    /// Jitter factor (0.0 to 1.0) to randomize delays
    #[serde(default)]
    pub jitter_factor: f64,

    /// Whether to respect retry-after hints
    #[serde(default = "default_true")]
    pub respect_retry_after: bool,

    /// Maximum total time to spend retrying (milliseconds)
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_max_retries() -> u32 {
    4
}
fn default_initial_delay_ms() -> u64 {
    1_000
}
fn default_max_delay_ms() -> u64 {
    8_000
}
fn default_exponential_base() -> f64 {
    2.0
}
fn default_true() -> bool {
    true
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::quiz_generation()
    }
}

impl RetryPolicy {
    /// Create a policy with a custom retry count and default timing
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Five attempts in total, waiting 1s, 2s, 4s and 8s between them
    pub fn quiz_generation() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            exponential_base: default_exponential_base(),
            jitter_factor: 0.0,
            respect_retry_after: true,
            timeout_ms: None,
        }
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Total number of attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Calculate the delay before retry number `attempt` (0-based)
    pub fn calculate_delay<E: Retryable>(&self, attempt: u32, error: &E) -> Duration {
        if self.respect_retry_after {
            if let Some(retry_after) = error.retry_after() {
                return retry_after.min(Duration::from_millis(self.max_delay_ms));
            }
        }

        let base_delay = self.initial_delay_ms as f64 * self.exponential_base.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay_ms as f64);

        let delay_with_jitter = if self.jitter_factor > 0.0 {
            let mut rng = rand::thread_rng();
            let jitter_range = capped_delay * self.jitter_factor;
            let jitter = rng.gen_range(-jitter_range..=jitter_range);
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_millis(delay_with_jitter as u64)
    }

    /// Check if we should retry based on the error and retries already made
    pub fn should_retry<E: Retryable>(&self, error: &E, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_retryable()
    }
}

/// Result of a retry operation
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final outcome
    pub outcome: Result<T, E>,

    /// Number of retries made after the initial attempt
    pub retries: u32,

    /// Total time spent waiting between attempts
    pub total_delay_ms: u64,

    /// Messages of every error encountered, in order
    pub error_history: Vec<String>,
}

impl<T, E> RetryResult<T, E> {
    /// Discard the bookkeeping and keep the outcome
    pub fn into_result(self) -> Result<T, E> {
        self.outcome
    }
}

/// Executor for retry operations
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create a new retry executor with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The policy this executor applies
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut retries = 0;
        let mut total_delay_ms = 0;
        let mut error_history = Vec::new();
        let start_time = Instant::now();

        loop {
            let error = match operation().await {
                Ok(result) => {
                    return RetryResult {
                        outcome: Ok(result),
                        retries,
                        total_delay_ms,
                        error_history,
                    };
                }
                Err(error) => error,
            };

            error_history.push(error.to_string());

            let timed_out = self
                .policy
                .timeout_ms
                .is_some_and(|limit| start_time.elapsed().as_millis() > u128::from(limit));

            if timed_out || !self.policy.should_retry(&error, retries) {
                return RetryResult {
                    outcome: Err(error),
                    retries,
                    total_delay_ms,
                    error_history,
                };
            }

            let delay = self.policy.calculate_delay(retries, &error);
            warn!(
                "Attempt {} of {} failed: {}; retrying in {:?}",
                retries + 1,
                self.policy.max_attempts(),
                error,
                delay
            );
            total_delay_ms += delay.as_millis() as u64;

            tokio::time::sleep(delay).await;
            retries += 1;
        }
    }
}
