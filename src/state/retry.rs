//! Cooperative retry schedule for "not ready yet" replies.

use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::opts::Opts;

use super::action::Wait;

/// Retries that only yield before the schedule starts sleeping.
const YIELD_ATTEMPTS: u32 = 16;

/// Smallest sleep once the schedule leaves the yield phase.
const MIN_SLEEP: Duration = Duration::from_micros(1);

/// Retry schedule: yield a few times, then sleep with a doubling delay up to
/// a maximum, optionally giving up after a deadline.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    timeout: Option<Duration>,
    current: Duration,
    attempts: u32,
    started: Option<Instant>,
}

impl Backoff {
    pub fn new(opts: &Opts) -> Self {
        Self {
            initial: opts.retry_initial_backoff,
            max: opts.retry_max_backoff,
            timeout: opts.retry_timeout,
            current: opts.retry_initial_backoff,
            attempts: 0,
            started: None,
        }
    }

    /// Number of retries handed out since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Forget previous retries, e.g. after a chunk arrived.
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.attempts = 0;
        self.started = None;
    }

    /// Pause before the next retry.
    ///
    /// The deadline clock starts at the first call after construction or
    /// [`reset`](Self::reset), i.e. at the first "not ready" reply. Time spent
    /// in the initial start or fetch call is not counted.
    ///
    /// Returns `Error::Timeout` once the retry deadline has passed.
    pub fn next_wait(&mut self) -> Result<Wait> {
        let started = *self.started.get_or_insert_with(Instant::now);
        if let Some(timeout) = self.timeout
            && started.elapsed() >= timeout
        {
            return Err(Error::Timeout(timeout));
        }

        self.attempts = self.attempts.saturating_add(1);
        let delay = self.current;

        if delay.is_zero() {
            if self.attempts >= YIELD_ATTEMPTS && !self.max.is_zero() {
                self.current = MIN_SLEEP.min(self.max);
            }
            return Ok(Wait::Yield);
        }

        self.current = delay.saturating_mul(2).min(self.max);
        Ok(Wait::Sleep(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(initial_us: u64, max_us: u64) -> Opts {
        Opts {
            retry_initial_backoff: Duration::from_micros(initial_us),
            retry_max_backoff: Duration::from_micros(max_us),
            ..Opts::default()
        }
    }

    #[test]
    fn test_yields_then_sleeps() {
        let mut backoff = Backoff::new(&opts(0, 8));
        for _ in 0..YIELD_ATTEMPTS {
            assert_eq!(backoff.next_wait().unwrap(), Wait::Yield);
        }
        assert_eq!(backoff.next_wait().unwrap(), Wait::Sleep(Duration::from_micros(1)));
        assert_eq!(backoff.next_wait().unwrap(), Wait::Sleep(Duration::from_micros(2)));
        assert_eq!(backoff.next_wait().unwrap(), Wait::Sleep(Duration::from_micros(4)));
        assert_eq!(backoff.next_wait().unwrap(), Wait::Sleep(Duration::from_micros(8)));
        assert_eq!(backoff.next_wait().unwrap(), Wait::Sleep(Duration::from_micros(8)));
    }

    #[test]
    fn test_zero_max_only_yields() {
        let mut backoff = Backoff::new(&opts(0, 0));
        for _ in 0..100 {
            assert_eq!(backoff.next_wait().unwrap(), Wait::Yield);
        }
    }

    #[test]
    fn test_initial_sleep() {
        let mut backoff = Backoff::new(&opts(100, 150));
        assert_eq!(backoff.next_wait().unwrap(), Wait::Sleep(Duration::from_micros(100)));
        assert_eq!(backoff.next_wait().unwrap(), Wait::Sleep(Duration::from_micros(150)));
    }

    #[test]
    fn test_reset() {
        let mut backoff = Backoff::new(&opts(100, 1000));
        backoff.next_wait().unwrap();
        backoff.next_wait().unwrap();
        assert_eq!(backoff.attempts(), 2);
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_wait().unwrap(), Wait::Sleep(Duration::from_micros(100)));
    }

    #[test]
    fn test_timeout() {
        let mut backoff = Backoff::new(&Opts {
            retry_timeout: Some(Duration::ZERO),
            ..Opts::default()
        });
        assert!(matches!(backoff.next_wait(), Err(Error::Timeout(_))));
    }

    #[test]
    fn test_deadline_starts_at_first_wait() {
        let mut backoff = Backoff::new(&Opts {
            retry_timeout: Some(Duration::from_millis(10)),
            ..Opts::default()
        });
        std::thread::sleep(Duration::from_millis(20));
        assert!(backoff.next_wait().is_ok());

        std::thread::sleep(Duration::from_millis(20));
        assert!(matches!(backoff.next_wait(), Err(Error::Timeout(_))));

        backoff.reset();
        assert!(backoff.next_wait().is_ok());
    }
}
