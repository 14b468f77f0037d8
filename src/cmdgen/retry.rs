//! Retransmission policy.
//!
//! A request is sent once and then retransmitted up to `retries` more times,
//! each time its response timeout expires. The [`Backoff`] decides how long
//! to wait between the timeout and the retransmission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Retry configuration for requests.
///
/// # Examples
///
/// ```rust
/// use snmp_engine::Retry;
/// use std::time::Duration;
///
/// // Send once (the default)
/// let retry = Retry::none();
///
/// // Retransmit up to 3 times as soon as each timeout expires
/// let retry = Retry::immediate(3);
///
/// // Wait 200ms after each timeout
/// let retry = Retry::fixed(3, Duration::from_millis(200));
///
/// // Exponential backoff with jitter (1s, 2s, 4s, 5s, 5s)
/// let retry = Retry::exponential(5)
///     .max_delay(Duration::from_secs(5))
///     .jitter(0.25)
///     .build();
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Retry {
    /// Retransmissions after the first send (0 = send once)
    pub retries: u32,
    /// Delay strategy between a timeout and the retransmission
    pub backoff: Backoff,
}

/// Delay between a timeout and the next retransmission.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Backoff {
    /// Retransmit as soon as the timeout expires.
    #[default]
    None,

    /// Fixed delay before each retransmission.
    Fixed {
        /// Delay before each retry
        delay: Duration,
    },

    /// Delay doubles after each attempt, capped at `max`.
    Exponential {
        /// Delay before the first retry
        initial: Duration,
        /// Maximum delay cap
        max: Duration,
        /// Jitter factor (0.0-1.0). E.g., 0.25 means ±25% randomization.
        jitter: f64,
    },
}

impl Retry {
    /// No retries: the request is sent once and fails on timeout.
    pub fn none() -> Self {
        Self::default()
    }

    /// Retransmit immediately on each timeout, up to `retries` times.
    pub fn immediate(retries: u32) -> Self {
        Self {
            retries,
            backoff: Backoff::None,
        }
    }

    /// Fixed delay between timeout and retransmission.
    pub fn fixed(retries: u32, delay: Duration) -> Self {
        Self {
            retries,
            backoff: Backoff::Fixed { delay },
        }
    }

    /// Start building an exponential backoff configuration.
    pub fn exponential(retries: u32) -> RetryBuilder {
        RetryBuilder {
            retries,
            ..Default::default()
        }
    }

    /// Delay before retransmission number `attempt` (0-based).
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay } => *delay,
            Backoff::Exponential {
                initial,
                max,
                jitter,
            } => {
                let shift = attempt.min(31);
                let multiplier = 1u32.checked_shl(shift).unwrap_or(u32::MAX);
                let capped = initial.saturating_mul(multiplier).min(*max);
                Duration::from_secs_f64(capped.as_secs_f64() * jitter_factor(*jitter))
            }
        }
    }
}

/// Builder for exponential backoff retry configuration.
pub struct RetryBuilder {
    retries: u32,
    initial: Duration,
    max: Duration,
    jitter: f64,
}

impl Default for RetryBuilder {
    fn default() -> Self {
        Self {
            retries: 3,
            initial: Duration::from_secs(1),
            max: Duration::from_secs(5),
            jitter: 0.25,
        }
    }
}

impl RetryBuilder {
    /// Set the delay before the first retry (default: 1 second).
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial = delay;
        self
    }

    /// Set the maximum delay cap (default: 5 seconds).
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max = delay;
        self
    }

    /// Set the jitter factor (default: 0.25), clamped to [0.0, 1.0].
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Build the [`Retry`] configuration.
    pub fn build(self) -> Retry {
        Retry {
            retries: self.retries,
            backoff: Backoff::Exponential {
                initial: self.initial,
                max: self.max,
                jitter: self.jitter,
            },
        }
    }
}

impl From<RetryBuilder> for Retry {
    fn from(builder: RetryBuilder) -> Self {
        builder.build()
    }
}

static JITTER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Pseudo-random factor in [1-jitter, 1+jitter] from a hashed counter.
fn jitter_factor(jitter: f64) -> f64 {
    if jitter <= 0.0 {
        return 1.0;
    }
    let counter = JITTER_COUNTER.fetch_add(1, Ordering::Relaxed);
    let hash = counter.wrapping_mul(0x5851f42d4c957f2d);
    let random = (hash >> 11) as f64 / ((1u64 << 53) as f64);
    1.0 + (random - 0.5) * 2.0 * jitter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sends_once() {
        let retry = Retry::default();
        assert_eq!(retry.retries, 0);
        assert_eq!(retry.compute_delay(0), Duration::ZERO);
    }

    #[test]
    fn test_fixed_delay() {
        let retry = Retry::fixed(2, Duration::from_millis(250));
        assert_eq!(retry.compute_delay(0), Duration::from_millis(250));
        assert_eq!(retry.compute_delay(7), Duration::from_millis(250));
    }

    #[test]
    fn test_exponential_without_jitter() {
        let retry = Retry::exponential(5)
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(500))
            .jitter(0.0)
            .build();

        assert_eq!(retry.compute_delay(0), Duration::from_millis(100));
        assert_eq!(retry.compute_delay(1), Duration::from_millis(200));
        assert_eq!(retry.compute_delay(2), Duration::from_millis(400));
        assert_eq!(retry.compute_delay(3), Duration::from_millis(500));
        // large attempt numbers saturate instead of overflowing
        assert_eq!(retry.compute_delay(100), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let retry = Retry::exponential(3)
            .initial_delay(Duration::from_secs(1))
            .jitter(0.25)
            .build();

        for _ in 0..100 {
            let delay = retry.compute_delay(0);
            assert!(delay >= Duration::from_millis(750));
            assert!(delay <= Duration::from_millis(1250));
        }
    }
}
