use std::fmt::Display;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

/// Retry with capped exponential backoff and proportional jitter.
///
/// Attempt `n` (0-based) that fails with a retryable error waits
/// `min(base * 2^n, max) * (1 ± jitter)` before attempt `n + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of the delay, e.g. 0.1 for ±10%.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// Backoff before the attempt following failed attempt `attempt`, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// `backoff` with jitter applied.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        if self.jitter <= 0.0 || backoff.is_zero() {
            return backoff;
        }
        let spread = rand::rng().random_range(-self.jitter..=self.jitter);
        backoff.mul_f64((1.0 + spread).max(0.0))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out. The last error is returned.
    pub fn run<T, E, F, P>(&self, context: &str, mut op: F, retryable: P) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            debug!(context, attempt = attempt + 1, attempts, "attempting");
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let can_retry = retryable(&e);
                    warn!(
                        context,
                        attempt = attempt + 1,
                        attempts,
                        retryable = can_retry,
                        error = %e,
                        "attempt failed"
                    );

                    if !can_retry || attempt + 1 >= attempts {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    debug!(context, delay_ms = delay.as_millis() as u64, "backing off");
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
