//! Retry policy for stream readers.
//!
//! Readers that fail are restarted after a bounded exponential delay:
//! `delay * 2^(attempt - 1)`, capped at `max_delay`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Base delay before the first retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Upper bound for any single retry delay.
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Retry settings of a reader.
///
/// Fields left out of a `retries` table fall back to the managed defaults,
/// so `[syslog.retries]` with only `max_retries = 3` keeps the 250ms / 30s
/// delays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Base delay.
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    /// Maximum delay between two attempts.
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Retry cap. `None` retries forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
            max_delay: DEFAULT_RETRY_MAX_DELAY,
            max_retries: None,
        }
    }
}

impl RetryOptions {
    /// Whether retries are unbounded.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.max_retries.is_none()
    }

    /// Whether retry number `attempt` (1-based) is still permitted.
    #[must_use]
    pub fn allows_attempt(&self, attempt: u32) -> bool {
        self.max_retries.is_none_or(|max| attempt <= max)
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Check the delays are usable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the base delay exceeds the maximum delay.
    pub fn validate(&self) -> Result<()> {
        if self.delay > self.max_delay {
            return Err(Error::invalid_config(format!(
                "retry delay {:?} exceeds max_delay {:?}",
                self.delay, self.max_delay
            )));
        }
        Ok(())
    }
}
