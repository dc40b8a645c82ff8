// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory event types.

use crate::cache::DeviceRecord;
use crate::types::DeviceId;

/// Events published by the [`EventBus`](super::EventBus) binding.
#[derive(Debug, Clone)]
pub enum AccessoryEvent {
    /// A lock should be added to the host.
    Registered {
        /// Snapshot at registration time.
        record: DeviceRecord,
    },

    /// A lock's characteristics should be refreshed.
    StateReflected {
        /// The latest snapshot.
        record: DeviceRecord,
    },

    /// A lock should be removed from the host.
    Removed {
        /// The ID of the removed lock.
        device_id: DeviceId,
    },
}

impl AccessoryEvent {
    /// Returns the device ID associated with this event.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::Registered { record } | Self::StateReflected { record } => record.device_id(),
            Self::Removed { device_id } => device_id,
        }
    }

    /// Returns the record carried by this event, if any.
    #[must_use]
    pub fn record(&self) -> Option<&DeviceRecord> {
        match self {
            Self::Registered { record } | Self::StateReflected { record } => Some(record),
            Self::Removed { .. } => None,
        }
    }

    /// Returns `true` if this is a lifecycle event (registered/removed).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Registered { .. } | Self::Removed { .. })
    }
}
