// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Battery level type.
//!
//! The vendor reports the battery as a percentage. Anything at or below
//! [`BatteryLevel::LOW_THRESHOLD`] is shown to the user as low.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Battery charge as a percentage (0-100).
///
/// # Examples
///
/// ```
/// use sesame_bridge::types::{BatteryLevel, LowBattery};
///
/// let level = BatteryLevel::new(20).unwrap();
/// assert!(level.is_low());
/// assert_eq!(level.status(), LowBattery::Low);
///
/// // Wire values outside the range are clamped rather than rejected
/// assert_eq!(BatteryLevel::clamped(130).value(), 100);
///
/// assert!(BatteryLevel::new(101).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct BatteryLevel(u8);

impl BatteryLevel {
    /// Empty battery.
    pub const MIN: Self = Self(0);

    /// Full battery.
    pub const MAX: Self = Self(100);

    /// Levels at or below this percentage are reported as low.
    pub const LOW_THRESHOLD: u8 = 20;

    /// Creates a new battery level.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > Self::MAX.0 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: u16::from(Self::MAX.0),
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a battery level from a vendor-reported number, saturating
    /// into 0-100.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        // Infallible after the clamp.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.clamp(0, i64::from(Self::MAX.0)) as u8;
        Self(value)
    }

    /// Returns the percentage.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns true if the battery should be reported as low.
    #[must_use]
    pub const fn is_low(&self) -> bool {
        self.0 <= Self::LOW_THRESHOLD
    }

    /// Returns the low-battery status for the accessory layer.
    #[must_use]
    pub const fn status(&self) -> LowBattery {
        if self.is_low() {
            LowBattery::Low
        } else {
            LowBattery::Normal
        }
    }
}

impl TryFrom<u8> for BatteryLevel {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BatteryLevel> for u8 {
    fn from(level: BatteryLevel) -> Self {
        level.0
    }
}

impl fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Low-battery status as shown by the accessory layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LowBattery {
    /// Battery level is above the low threshold.
    Normal,
    /// Battery level is at or below the low threshold.
    Low,
}
