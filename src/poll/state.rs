// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll scheduling state.

use std::time::Duration;

use super::PollConfig;

/// What the polling controller is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PollPhase {
    /// No timer is armed.
    #[default]
    Idle,
    /// The timer is armed for the next refresh.
    Scheduled,
    /// A refresh is in flight.
    Refreshing,
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
    /// Devices were fetched; `changed` is true if any lock state moved.
    Synced {
        /// Whether any lock changed state during the cycle.
        changed: bool,
    },
    /// Login or a fetch failed.
    Failed,
}

impl RefreshOutcome {
    /// Returns true if the cycle fetched devices successfully.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

/// Counters deciding the next polling interval.
///
/// `short_poll_elapsed_count` never exceeds `max_short_poll_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    valid_data: bool,
    short_poll_elapsed_count: u32,
    max_short_poll_count: u32,
    failure_streak: u32,
    phase: PollPhase,
}

impl PollState {
    /// Creates the initial state: no valid data, short polls exhausted.
    #[must_use]
    pub fn new(max_short_poll_count: u32) -> Self {
        Self {
            valid_data: false,
            short_poll_elapsed_count: max_short_poll_count,
            max_short_poll_count,
            failure_streak: 0,
            phase: PollPhase::Idle,
        }
    }

    /// Returns the interval to arm the timer with.
    #[must_use]
    pub fn next_interval(&self, config: &PollConfig) -> Duration {
        if self.short_poll_elapsed_count < self.max_short_poll_count {
            config.short_interval()
        } else {
            config.long_interval()
        }
    }

    /// Counts a fired timer against the short-polling window.
    pub fn tick(&mut self) {
        if self.short_poll_elapsed_count < self.max_short_poll_count {
            self.short_poll_elapsed_count += 1;
        }
    }

    /// Restarts the short-polling window.
    pub fn accelerate(&mut self) {
        self.short_poll_elapsed_count = 0;
    }

    /// Folds a refresh result into the counters.
    ///
    /// Returns true if the pending timer should be re-armed early.
    pub fn record(&mut self, outcome: RefreshOutcome) -> bool {
        match outcome {
            RefreshOutcome::Synced { changed } => {
                self.valid_data = true;
                self.failure_streak = 0;
                if changed {
                    self.accelerate();
                }
                changed
            }
            RefreshOutcome::Failed => {
                self.valid_data = false;
                self.failure_streak = self.failure_streak.saturating_add(1);
                // Only the first failure of a streak earns a short retry, so an
                // outage settles into long polls instead of hammering the API.
                if self.failure_streak == 1 {
                    self.short_poll_elapsed_count = self.max_short_poll_count.saturating_sub(1);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Returns true if the last refresh fetched devices successfully.
    #[must_use]
    pub fn valid_data(&self) -> bool {
        self.valid_data
    }

    /// Returns how many short polls were used in the current window.
    #[must_use]
    pub fn short_poll_elapsed_count(&self) -> u32 {
        self.short_poll_elapsed_count
    }

    /// Returns the short-poll budget per window.
    #[must_use]
    pub fn max_short_poll_count(&self) -> u32 {
        self.max_short_poll_count
    }

    /// Returns the number of consecutive failed refreshes.
    #[must_use]
    pub fn failure_streak(&self) -> u32 {
        self.failure_streak
    }

    /// Returns the controller phase.
    #[must_use]
    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub(super) fn set_phase(&mut self, phase: PollPhase) {
        self.phase = phase;
    }
}
