use std::thread;
use std::time::Duration;

use crate::error::StatsError;

/// Bounded retry with a fixed delay between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// A policy running at most `attempts` times (at least once).
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Polls every `interval` for roughly `timeout`: `1 + timeout / interval` attempts.
    pub fn for_timeout(timeout: Duration, interval: Duration) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let polls = timeout.as_millis() / interval_ms;
        let attempts = u32::try_from(polls).unwrap_or(u32::MAX - 1).saturating_add(1);
        Self::new(attempts, interval)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `action` until it succeeds or the attempt budget is spent.
    ///
    /// Sleeps for the configured delay after each failed attempt except the
    /// last. Exhaustion yields [`StatsError::RetryExhausted`] wrapping the
    /// last failure.
    pub fn execute<T, F>(&self, action: F) -> Result<T, StatsError>
    where
        F: FnMut() -> Result<T, StatsError>,
    {
        self.execute_if(action, |_| true)
    }

    /// Like [`execute`](Self::execute), but gives up early on a failure
    /// `retryable` rejects.
    pub fn execute_if<T, F, R>(&self, mut action: F, retryable: R) -> Result<T, StatsError>
    where
        F: FnMut() -> Result<T, StatsError>,
        R: Fn(&StatsError) -> bool,
    {
        let mut attempt = 1;
        loop {
            match action() {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.attempts || !retryable(&err) => {
                    log::debug!("retry: giving up after {attempt} attempts: {err}");
                    return Err(StatsError::RetryExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    log::trace!("retry: attempt {attempt}/{} failed: {err}", self.attempts);
                    attempt += 1;
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                }
            }
        }
    }
}
