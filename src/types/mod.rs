// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for Sesame lock state.
//!
//! Each type checks its range at construction time so the cache and the
//! accessory layer never see an out-of-range value.
//!
//! # Types
//!
//! - [`DeviceId`] - Vendor-assigned lock identifier
//! - [`LockState`] - Secured/Unsecured
//! - [`BatteryLevel`] - Battery charge (0-100%)
//! - [`LowBattery`] - Normal/Low status derived from the battery level

mod battery;
mod device_id;
mod lock;

pub use battery::{BatteryLevel, LowBattery};
pub use device_id::DeviceId;
pub use lock::LockState;
