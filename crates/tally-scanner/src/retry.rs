//! # Retry Policy
//!
//! One bounded exponential policy shared by every failure path that retries
//! on its own: camera stream recovery and decode engine init.
//!
//! ## Schedule (defaults)
//! ```text
//! attempt 1 ──► wait 500ms
//! attempt 2 ──► wait 1s
//! attempt 3 ──► wait 2s
//! attempt 4 ──► None (give up, surface the error)
//!
//! Delays double up to max_delay (4s), without jitter.
//! ```

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

/// Bounded exponential retry policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts allowed in total. 1 means "try once, never retry".
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn once() -> Self {
        RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Starts a fresh schedule.
    pub fn schedule(&self) -> RetrySchedule {
        RetrySchedule {
            max_attempts: self.max_attempts,
            backoff: self.create_backoff(),
            attempt: 0,
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_max_interval(self.max_delay)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Progress through one retry sequence.
pub struct RetrySchedule {
    max_attempts: u32,
    backoff: ExponentialBackoff,
    attempt: u32,
}

impl std::fmt::Debug for RetrySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrySchedule")
            .field("attempt", &self.attempt)
            .field("max_attempts", &self.max_attempts)
            .field("next_interval", &self.backoff.current_interval)
            .finish()
    }
}

impl RetrySchedule {
    /// Delay before the next attempt, or `None` once attempts are spent.
    ///
    /// For stream recovery every attempt is a retry, so `max_attempts`
    /// delays are handed out. For init retries the first try is not counted
    /// here; see [`RetrySchedule::next_retry_delay`].
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;
        self.backoff.next_backoff()
    }

    /// Delay before a retry that follows an initial try. Hands out
    /// `max_attempts - 1` delays.
    pub fn next_retry_delay(&mut self) -> Option<Duration> {
        if self.attempt + 1 >= self.max_attempts {
            return None;
        }
        self.attempt += 1;
        self.backoff.next_backoff()
    }

    /// Attempts handed out so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
        self.backoff.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_default_schedule() {
        let mut schedule = RetryPolicy::default().schedule();
        assert_eq!(schedule.next_delay(), Some(ms(500)));
        assert_eq!(schedule.next_delay(), Some(ms(1000)));
        assert_eq!(schedule.next_delay(), Some(ms(2000)));
        assert_eq!(schedule.next_delay(), None);
        assert!(schedule.is_exhausted());
        assert_eq!(schedule.attempt(), 3);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 6,
            ..Default::default()
        };
        let delays: Vec<Duration> = std::iter::from_fn({
            let mut schedule = policy.schedule();
            move || schedule.next_delay()
        })
        .collect();
        assert_eq!(
            delays,
            vec![ms(500), ms(1000), ms(2000), ms(4000), ms(4000), ms(4000)]
        );
    }

    #[test]
    fn test_once_never_retries() {
        let mut schedule = RetryPolicy::once().schedule();
        assert_eq!(schedule.next_retry_delay(), None);
    }

    #[test]
    fn test_retry_delays_exclude_first_try() {
        let mut schedule = RetryPolicy::default().schedule();
        assert_eq!(schedule.next_retry_delay(), Some(ms(500)));
        assert_eq!(schedule.next_retry_delay(), Some(ms(1000)));
        assert_eq!(schedule.next_retry_delay(), None);
    }

    #[test]
    fn test_reset_starts_over() {
        let mut schedule = RetryPolicy::default().schedule();
        schedule.next_delay();
        schedule.next_delay();
        schedule.reset();
        assert_eq!(schedule.attempt(), 0);
        assert_eq!(schedule.next_delay(), Some(ms(500)));
    }
}
