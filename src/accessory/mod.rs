// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory layer seam.
//!
//! The host framework owns the accessory objects. The bridge only tells it
//! what to show through [`AccessoryBinding`]; user actions come back in
//! through [`SesameBridge::on_user_set_target`](crate::SesameBridge::on_user_set_target).
//!
//! [`EventBus`] is a ready-made binding that turns every call into an
//! [`AccessoryEvent`] on a broadcast channel.
//!
//! # Examples
//!
//! ```
//! use sesame_bridge::accessory::{AccessoryBinding, AccessoryEvent, EventBus};
//! use sesame_bridge::cache::DeviceRecord;
//! use sesame_bridge::types::DeviceId;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let record = DeviceRecord::new(DeviceId::new("SESAME-1").unwrap());
//! bus.register_device(&record);
//!
//! assert!(matches!(rx.try_recv(), Ok(AccessoryEvent::Registered { .. })));
//! ```

mod event;
mod event_bus;

pub use event::AccessoryEvent;
pub use event_bus::EventBus;

use crate::cache::DeviceRecord;
use crate::types::DeviceId;

/// Manufacturer shown on every accessory.
pub const MANUFACTURER: &str = "CANDY HOUSE";

/// Host-side view of the device cache.
///
/// Calls are made outside any cache lock and must not block for long.
pub trait AccessoryBinding: Send + Sync + 'static {
    /// A lock was discovered, or rediscovered after being removed.
    fn register_device(&self, record: &DeviceRecord);

    /// A known lock has a new snapshot.
    fn reflect_state(&self, record: &DeviceRecord);

    /// A lock is gone: missing from the device list or failed a command.
    fn remove_device(&self, device_id: &DeviceId);
}

/// Battery charging state. Sesame locks run on primary cells, so it is
/// always [`ChargingState::NotChargeable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargingState {
    /// The battery cannot be charged.
    NotChargeable,
}

/// Values of the accessory information service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInfo {
    manufacturer: &'static str,
    model: String,
    serial_number: String,
}

impl AccessoryInfo {
    /// Creates accessory information for a Sesame lock.
    #[must_use]
    pub fn new(model: impl Into<String>, serial_number: impl Into<String>) -> Self {
        Self {
            manufacturer: MANUFACTURER,
            model: model.into(),
            serial_number: serial_number.into(),
        }
    }

    /// Returns the manufacturer.
    #[must_use]
    pub fn manufacturer(&self) -> &str {
        self.manufacturer
    }

    /// Returns the model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the serial number.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Returns the charging state reported for the battery service.
    #[must_use]
    pub fn charging_state(&self) -> ChargingState {
        ChargingState::NotChargeable
    }
}
