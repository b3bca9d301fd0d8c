//! Bounded retry with exponential backoff for transient network failures.
//!
//! The schedule is an explicit loop with an attempt counter and a pure delay
//! computation, so both halves are testable in isolation. Waiting never holds
//! any shared lock; a retrying fetch only delays its own request.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Retry schedule: `max_attempts` total tries, delays doubling from
/// `base_delay` up to `max_delay`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before the given attempt number (attempts are 1-based;
    /// the first attempt has no delay).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let doublings = attempt.saturating_sub(2);
        let delay = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(doublings));
        delay.min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds or the attempt budget is exhausted.
///
/// The closure receives the 1-based attempt number. On exhaustion the final
/// error is returned together with the number of attempts made.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, (E, u32)>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err((err, attempt));
                }
                let delay = policy.delay_before(attempt + 1);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn delay_schedule_doubles_up_to_the_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_secs(4));
        assert_eq!(policy.delay_before(3), Duration::from_secs(8));
        assert_eq!(policy.delay_before(4), Duration::from_secs(10));
        assert_eq!(policy.delay_before(5), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_exactly_three_attempts_with_backoff() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let started = Instant::now();
        let second_attempt_at = Arc::new(parking_lot::Mutex::new(None));
        let second_slot = second_attempt_at.clone();

        let result: Result<(), (String, u32)> =
            retry_with_backoff(RetryPolicy::default(), move |attempt| {
                counter.fetch_add(1, Ordering::SeqCst);
                if attempt == 2 {
                    *second_slot.lock() = Some(Instant::now());
                }
                async { Err("connect timed out".to_string()) }
            })
            .await;

        let (_, attempts_made) = result.unwrap_err();
        assert_eq!(attempts_made, 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        // Second attempt starts no earlier than the 4s base delay, and the
        // whole schedule adds 4s + 8s of backoff.
        let second_at = second_attempt_at.lock().expect("second attempt recorded");
        assert!(second_at - started >= Duration::from_secs(4));
        assert!(started.elapsed() >= Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_retrying_after_first_success() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let result: Result<u32, (String, u32)> =
            retry_with_backoff(RetryPolicy::default(), move |attempt| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err("flaky".to_string())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
