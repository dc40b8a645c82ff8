// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cached mirror of a single lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accessory::AccessoryInfo;
use crate::types::{BatteryLevel, DeviceId, LockState, LowBattery};

use super::{DeviceUpdate, StateSource};

/// Model name reported for every lock.
pub const DEFAULT_MODEL: &str = "Sesame";

/// Last known state of one lock.
///
/// A record starts out secured, reachable and with no battery reading
/// until the vendor reports one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    device_id: DeviceId,
    serial_number: String,
    model: String,
    display_name: String,
    lock_state: LockState,
    battery: Option<BatteryLevel>,
    reachable: bool,
    state_source: StateSource,
    updated_at: DateTime<Utc>,
}

impl DeviceRecord {
    /// Creates a record with default metadata derived from the identifier.
    #[must_use]
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            serial_number: device_id.as_str().to_string(),
            model: DEFAULT_MODEL.to_string(),
            display_name: format!("{DEFAULT_MODEL} {device_id}"),
            device_id,
            lock_state: LockState::Secured,
            battery: None,
            reachable: true,
            state_source: StateSource::Confirmed,
            updated_at: Utc::now(),
        }
    }

    /// Merges an update into the record.
    ///
    /// Returns `true` if the lock state differs from the previous value.
    pub fn apply(&mut self, update: DeviceUpdate) -> bool {
        let previous = self.lock_state;

        if let Some(serial) = update.serial_number {
            self.serial_number = serial;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(name) = update.display_name {
            self.display_name = name;
        }
        if let Some(battery) = update.battery {
            self.battery = Some(battery);
        }
        if let Some(reachable) = update.reachable {
            self.reachable = reachable;
        }
        if let Some(state) = update.lock_state {
            self.lock_state = state;
            self.state_source = update.source;
        }
        self.updated_at = Utc::now();

        self.lock_state != previous
    }

    /// Returns the vendor identifier.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Returns the serial number.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the name shown to the user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the lock state.
    #[must_use]
    pub fn lock_state(&self) -> LockState {
        self.lock_state
    }

    /// Returns the battery level, if one was reported.
    #[must_use]
    pub fn battery(&self) -> Option<BatteryLevel> {
        self.battery
    }

    /// Returns true if the battery is at or below the low threshold.
    #[must_use]
    pub fn low_battery(&self) -> bool {
        self.battery.is_some_and(|b| b.is_low())
    }

    /// Returns the low-battery status for the accessory layer.
    #[must_use]
    pub fn low_battery_status(&self) -> LowBattery {
        self.battery.map_or(LowBattery::Normal, |b| b.status())
    }

    /// Returns true if the lock was present in the last device list.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    /// Returns where the current lock state came from.
    #[must_use]
    pub fn state_source(&self) -> StateSource {
        self.state_source
    }

    /// Returns true if the lock state was read back from the vendor.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.state_source == StateSource::Confirmed
    }

    /// Returns when the record was last written.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the accessory information service values.
    #[must_use]
    pub fn accessory_info(&self) -> AccessoryInfo {
        AccessoryInfo::new(&self.model, &self.serial_number)
    }

    pub(super) fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> DeviceId {
        DeviceId::new("SESAME-1").unwrap()
    }

    #[test]
    fn new_record_defaults() {
        let record = DeviceRecord::new(id());
        assert_eq!(record.lock_state(), LockState::Secured);
        assert_eq!(record.serial_number(), "SESAME-1");
        assert_eq!(record.model(), "Sesame");
        assert_eq!(record.display_name(), "Sesame SESAME-1");
        assert!(record.is_reachable());
        assert!(!record.low_battery());
    }

    #[test]
    fn apply_reports_lock_transitions_only() {
        let mut record = DeviceRecord::new(id());

        let battery_only = DeviceUpdate::confirmed().with_battery(BatteryLevel::new(10).unwrap());
        assert!(!record.apply(battery_only));
        assert!(record.low_battery());

        let unlock = DeviceUpdate::confirmed().with_lock_state(LockState::Unsecured);
        assert!(record.apply(unlock.clone()));
        assert!(!record.apply(unlock));
    }

    #[test]
    fn provisional_source_is_tracked() {
        let mut record = DeviceRecord::new(id());
        record.apply(DeviceUpdate::provisional().with_lock_state(LockState::Unsecured));
        assert_eq!(record.state_source(), StateSource::Provisional);
        assert!(!record.is_confirmed());

        record.apply(DeviceUpdate::confirmed().with_lock_state(LockState::Unsecured));
        assert!(record.is_confirmed());
    }

    #[test]
    fn accessory_info_uses_metadata() {
        let record = DeviceRecord::new(id());
        let info = record.accessory_info();
        assert_eq!(info.manufacturer(), "CANDY HOUSE");
        assert_eq!(info.serial_number(), "SESAME-1");
    }
}
