use std::fmt;
use std::future::Future;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};

/// Bounded attempts with a linearly growing delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Delay before the second attempt.
    pub backoff: Duration,
    /// Added to the delay for each further attempt.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 4,
            backoff: Duration::from_secs(3),
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay slept after the given (1-based) attempt failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff + self.backoff_step * attempt.saturating_sub(1)
    }

    /// Sum of all delays slept when every attempt fails.
    pub fn total_backoff(&self) -> Duration {
        (1..self.attempts.max(1)).map(|attempt| self.delay_after(attempt)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Done,
    Retry,
}

/// Runs `op` until `accept` says the result is final or the attempt budget
/// is spent, sleeping per `policy` between attempts. The last result is
/// returned as is.
pub async fn retry_with_backoff<T, E, Op, Fut, Accept>(
    policy: &RetryPolicy,
    label: &str,
    mut op: Op,
    accept: Accept,
) -> Result<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Accept: Fn(&Result<T, E>) -> RetryDecision,
    E: fmt::Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = op(attempt).await;
        if accept(&result) == RetryDecision::Done || attempt >= attempts {
            return result;
        }

        let delay = policy.delay_after(attempt);
        match &result {
            Err(err) => engine_warn!(
                "{} attempt {}/{} failed: {}; retrying in {:?}",
                label,
                attempt,
                attempts,
                err,
                delay
            ),
            Ok(_) => engine_info!(
                "{} attempt {}/{} not ready yet; retrying in {:?}",
                label,
                attempt,
                attempts,
                delay
            ),
        }
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
