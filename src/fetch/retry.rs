use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the `retry`-th retry (1-based): `base_delay * 2^(retry - 1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

#[derive(Debug, PartialEq)]
pub enum RetryError<E> {
    /// Every attempt failed with a transient error.
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error that is not worth retrying.
    Aborted { attempts: u32, error: E },
}

/// Runs `op` until it succeeds, a non-transient error shows up, or the budget is spent.
/// `op` receives the 1-based attempt number. Returns the value and the attempts used.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_transient: P,
    mut op: F,
) -> Result<(T, u32), RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(error) if !is_transient(&error) => {
                tracing::error!("❌ Attempt {}/{} failed permanently: {}", attempt, max_attempts, error);
                return Err(RetryError::Aborted { attempts: attempt, error });
            }
            Err(error) if attempt >= max_attempts => {
                tracing::error!("❌ All {} attempts failed, last error: {}", max_attempts, error);
                return Err(RetryError::Exhausted { attempts: attempt, last: error });
            }
            Err(error) => {
                let delay = policy.backoff(attempt) + policy.jitter();
                tracing::warn!(
                    "⚠️  Attempt {}/{} failed: {} - retrying in {:.1}s",
                    attempt,
                    max_attempts,
                    error,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
