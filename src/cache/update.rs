// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Partial updates merged into a [`DeviceRecord`](super::DeviceRecord).
//!
//! # Examples
//!
//! ```
//! use sesame_bridge::cache::{DeviceUpdate, StateSource};
//! use sesame_bridge::types::{BatteryLevel, LockState};
//!
//! // What a successful server read produces
//! let read = DeviceUpdate::confirmed()
//!     .with_lock_state(LockState::Unsecured)
//!     .with_battery(BatteryLevel::new(80).unwrap());
//!
//! // What a confirmed command produces before the next poll
//! let command = DeviceUpdate::provisional().with_lock_state(LockState::Secured);
//! assert_eq!(command.source(), StateSource::Provisional);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{BatteryLevel, LockState};

/// Where a lock state value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateSource {
    /// Read back from the vendor; ground truth.
    #[default]
    Confirmed,
    /// Reported by a successful command; holds until the next read.
    Provisional,
}

/// Fields to merge into a cached record. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceUpdate {
    pub(crate) serial_number: Option<String>,
    pub(crate) model: Option<String>,
    pub(crate) display_name: Option<String>,
    pub(crate) lock_state: Option<LockState>,
    pub(crate) battery: Option<BatteryLevel>,
    pub(crate) reachable: Option<bool>,
    pub(crate) source: StateSource,
}

impl DeviceUpdate {
    /// Creates an empty update for data read from the vendor.
    #[must_use]
    pub fn confirmed() -> Self {
        Self::default()
    }

    /// Creates an empty update for data reported by a command response.
    #[must_use]
    pub fn provisional() -> Self {
        Self {
            source: StateSource::Provisional,
            ..Self::default()
        }
    }

    /// Sets the serial number.
    #[must_use]
    pub fn with_serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the lock state.
    #[must_use]
    pub fn with_lock_state(mut self, state: LockState) -> Self {
        self.lock_state = Some(state);
        self
    }

    /// Sets the battery level.
    #[must_use]
    pub fn with_battery(mut self, battery: BatteryLevel) -> Self {
        self.battery = Some(battery);
        self
    }

    /// Sets reachability.
    #[must_use]
    pub fn with_reachable(mut self, reachable: bool) -> Self {
        self.reachable = Some(reachable);
        self
    }

    /// Returns where the lock state in this update came from.
    #[must_use]
    pub fn source(&self) -> StateSource {
        self.source
    }

    /// Returns the lock state carried by this update.
    #[must_use]
    pub fn lock_state(&self) -> Option<LockState> {
        self.lock_state
    }

    /// Returns true if the update carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.serial_number.is_none()
            && self.model.is_none()
            && self.display_name.is_none()
            && self.lock_state.is_none()
            && self.battery.is_none()
            && self.reachable.is_none()
    }
}
