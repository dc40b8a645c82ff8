// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValueError;

/// Vendor-assigned identifier of a Sesame lock.
///
/// This is the only stable key shared by the device cache and the accessory
/// layer. The host framework needs a UUID per accessory, which is derived
/// deterministically from the identifier by [`DeviceId::accessory_uuid`].
///
/// # Examples
///
/// ```
/// use sesame_bridge::types::DeviceId;
///
/// let id = DeviceId::new("ABC1234567").unwrap();
/// assert_eq!(id.as_str(), "ABC1234567");
/// assert_eq!(id.accessory_uuid(), DeviceId::new("ABC1234567").unwrap().accessory_uuid());
///
/// assert!(DeviceId::new("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device identifier.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyDeviceId` if the identifier is empty or blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValueError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValueError::EmptyDeviceId);
        }
        Ok(Self(id))
    }

    /// Returns the identifier as sent by the vendor.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the stable accessory UUID for this lock.
    #[must_use]
    pub fn accessory_uuid(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.0.as_bytes())
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for DeviceId {
    type Error = ValueError;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ValueError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank() {
        assert_eq!(DeviceId::new("  ").unwrap_err(), ValueError::EmptyDeviceId);
    }

    #[test]
    fn accessory_uuid_is_stable_per_id() {
        let a = DeviceId::new("lock-a").unwrap();
        let b = DeviceId::new("lock-b").unwrap();
        assert_eq!(a.accessory_uuid(), DeviceId::new("lock-a").unwrap().accessory_uuid());
        assert_ne!(a.accessory_uuid(), b.accessory_uuid());
    }

    #[test]
    fn debug_format() {
        let id = DeviceId::new("XYZ").unwrap();
        assert_eq!(format!("{id:?}"), "DeviceId(XYZ)");
    }

    #[test]
    fn display_format() {
        let id = DeviceId::new("XYZ").unwrap();
        assert_eq!(id.to_string(), "XYZ");
    }

    #[test]
    fn serde_uses_plain_string() {
        let id: DeviceId = serde_json::from_str("\"SN-1\"").unwrap();
        assert_eq!(id.as_str(), "SN-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"SN-1\"");
        assert!(serde_json::from_str::<DeviceId>("\"\"").is_err());
    }

    #[test]
    fn hashable() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        let id = DeviceId::new("SN-1").unwrap();
        set.insert(id.clone());
        assert!(set.contains(&id));
    }
}
