// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling cadence.

use std::time::Duration;

use crate::error::ConfigError;

/// Short and long polling intervals.
///
/// After activity the poller uses the short interval for
/// `short_duration / short_interval` cycles, then falls back to the long one.
///
/// # Examples
///
/// ```
/// use sesame_bridge::poll::PollConfig;
/// use std::time::Duration;
///
/// let config = PollConfig::default();
/// assert_eq!(config.long_interval(), Duration::from_secs(300));
/// assert_eq!(config.max_short_poll_count(), 24);
///
/// let config = PollConfig::new()
///     .with_short_interval(Duration::from_secs(10))
///     .with_short_duration(Duration::from_secs(25));
/// assert_eq!(config.max_short_poll_count(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    long_interval: Duration,
    short_interval: Duration,
    short_duration: Duration,
}

impl PollConfig {
    /// Default steady-state interval.
    pub const DEFAULT_LONG_INTERVAL: Duration = Duration::from_secs(300);
    /// Default interval after activity.
    pub const DEFAULT_SHORT_INTERVAL: Duration = Duration::from_secs(5);
    /// Default length of the short-polling window.
    pub const DEFAULT_SHORT_DURATION: Duration = Duration::from_secs(120);

    /// Creates the default cadence (300s / 5s for 120s).
    #[must_use]
    pub fn new() -> Self {
        Self {
            long_interval: Self::DEFAULT_LONG_INTERVAL,
            short_interval: Self::DEFAULT_SHORT_INTERVAL,
            short_duration: Self::DEFAULT_SHORT_DURATION,
        }
    }

    /// Sets the steady-state interval.
    #[must_use]
    pub fn with_long_interval(mut self, interval: Duration) -> Self {
        self.long_interval = interval;
        self
    }

    /// Sets the interval used after activity.
    #[must_use]
    pub fn with_short_interval(mut self, interval: Duration) -> Self {
        self.short_interval = interval;
        self
    }

    /// Sets how long short polling lasts after activity.
    #[must_use]
    pub fn with_short_duration(mut self, duration: Duration) -> Self {
        self.short_duration = duration;
        self
    }

    /// Returns the steady-state interval.
    #[must_use]
    pub fn long_interval(&self) -> Duration {
        self.long_interval
    }

    /// Returns the interval used after activity.
    #[must_use]
    pub fn short_interval(&self) -> Duration {
        self.short_interval
    }

    /// Returns how long short polling lasts after activity.
    #[must_use]
    pub fn short_duration(&self) -> Duration {
        self.short_duration
    }

    /// Number of short polls after activity: `floor(short_duration / short_interval)`.
    #[must_use]
    pub fn max_short_poll_count(&self) -> u32 {
        let interval = self.short_interval.as_nanos();
        if interval == 0 {
            return 0;
        }
        u32::try_from(self.short_duration.as_nanos() / interval).unwrap_or(u32::MAX)
    }

    /// Checks that both intervals are non-zero.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidInterval` naming the zero interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.long_interval.is_zero() {
            return Err(ConfigError::InvalidInterval("long poll interval"));
        }
        if self.short_interval.is_zero() {
            return Err(ConfigError::InvalidInterval("short poll interval"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}
