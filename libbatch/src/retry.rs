use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Bounded retry with exponential backoff and no jitter.
///
/// The n-th retry (0-based) waits `base_delay * 2^n`. After `max_attempts`
/// consecutive failures the last error is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

/// State of one in-flight policy invocation. Dropped when `retry_when` returns.
struct RetryAttempt<E> {
    attempt: u32,
    max_attempts: u32,
    waited: Vec<Duration>,
    last_error: Option<E>,
}

impl<E> RetryAttempt<E> {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            waited: Vec::new(),
            last_error: None,
        }
    }

    fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay before the retry with the given 0-based index.
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let factor = 2u32.checked_pow(retry_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Retries every failure until the attempt budget is spent.
    pub async fn retry<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.retry_when(op, |_| true).await
    }

    /// Retries only the failures `should_retry` accepts; any other failure is
    /// returned straight away.
    pub async fn retry_when<T, E, F, Fut, P>(&self, mut op: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut state = RetryAttempt::new(self.max_attempts.max(1));

        loop {
            state.attempt += 1;
            match op().await {
                Ok(value) => {
                    if let Some(last_error) = &state.last_error {
                        tracing::debug!(
                            attempt = state.attempt,
                            waited_ms = state.waited.iter().map(Duration::as_millis).sum::<u128>() as u64,
                            last_error = %last_error,
                            "operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if state.exhausted() || !should_retry(&err) {
                        return Err(err);
                    }

                    let delay = self.delay_for(state.attempt - 1);
                    tracing::warn!(
                        attempt = state.attempt,
                        max_attempts = state.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retry {}/{} after {}ms",
                        state.attempt,
                        state.max_attempts,
                        delay.as_millis()
                    );
                    state.last_error = Some(err);
                    state.waited.push(delay);
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Shorthand for `RetryPolicy::new(max_attempts, base_delay).retry(op)`.
pub async fn with_retry<T, E, F, Fut>(op: F, max_attempts: u32, base_delay: Duration) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryPolicy::new(max_attempts, base_delay).retry(op).await
}
