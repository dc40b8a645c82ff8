// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory device cache.
//!
//! [`DeviceCache`] maps vendor identifiers to the last known
//! [`DeviceRecord`]. It is the single source of truth read by the accessory
//! layer. The cache is passive: it never touches the network or timers.
//!
//! # Examples
//!
//! ```
//! use sesame_bridge::cache::{DeviceCache, DeviceUpdate};
//! use sesame_bridge::types::{DeviceId, LockState};
//!
//! let mut cache = DeviceCache::new();
//! let id = DeviceId::new("SESAME-1").unwrap();
//!
//! // Creation is not a transition
//! assert!(!cache.upsert(&id, DeviceUpdate::confirmed().with_lock_state(LockState::Secured)));
//!
//! // A different lock state is
//! assert!(cache.upsert(&id, DeviceUpdate::confirmed().with_lock_state(LockState::Unsecured)));
//! assert_eq!(cache.get(&id).unwrap().lock_state(), LockState::Unsecured);
//! ```

mod record;
mod update;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

pub use record::{DEFAULT_MODEL, DeviceRecord};
pub use update::{DeviceUpdate, StateSource};

use crate::types::DeviceId;

/// Cache shared between the poller, the dispatcher and the bridge.
pub type SharedCache = Arc<Mutex<DeviceCache>>;

/// Last known state of every discovered lock, keyed by vendor identifier.
#[derive(Debug, Clone, Default)]
pub struct DeviceCache {
    records: HashMap<DeviceId, DeviceRecord>,
}

impl DeviceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache wrapped for sharing.
    #[must_use]
    pub fn shared() -> SharedCache {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Merges an update into the record for `device_id`, creating it if absent.
    ///
    /// Returns `true` only if an existing record's lock state changed.
    pub fn upsert(&mut self, device_id: &DeviceId, update: DeviceUpdate) -> bool {
        if let Some(record) = self.records.get_mut(device_id) {
            return record.apply(update);
        }

        let mut record = DeviceRecord::new(device_id.clone());
        record.apply(update);
        self.records.insert(device_id.clone(), record);
        false
    }

    /// Seeds a record the host already knows, e.g. from its own cache.
    ///
    /// The record is stored as reachable so the next device list either
    /// confirms it or removes it. Returns `false` and leaves the cache
    /// untouched if the device is already cached.
    pub fn restore(&mut self, mut record: DeviceRecord) -> bool {
        if self.records.contains_key(record.device_id()) {
            return false;
        }
        record.set_reachable(true);
        self.records.insert(record.device_id().clone(), record);
        true
    }

    /// Marks a record unreachable without removing it.
    ///
    /// Returns `false` if the device is unknown.
    pub fn mark_unreachable(&mut self, device_id: &DeviceId) -> bool {
        match self.records.get_mut(device_id) {
            Some(record) => {
                record.set_reachable(false);
                true
            }
            None => false,
        }
    }

    /// Removes a record.
    pub fn remove(&mut self, device_id: &DeviceId) -> Option<DeviceRecord> {
        self.records.remove(device_id)
    }

    /// Returns a copy of the record for `device_id`.
    #[must_use]
    pub fn get(&self, device_id: &DeviceId) -> Option<DeviceRecord> {
        self.records.get(device_id).cloned()
    }

    /// Returns true if the device is cached.
    #[must_use]
    pub fn contains(&self, device_id: &DeviceId) -> bool {
        self.records.contains_key(device_id)
    }

    /// Returns true if the device is cached and reachable.
    #[must_use]
    pub fn is_reachable(&self, device_id: &DeviceId) -> bool {
        self.records
            .get(device_id)
            .is_some_and(DeviceRecord::is_reachable)
    }

    /// Returns a snapshot of every record. Order is unspecified.
    #[must_use]
    pub fn all(&self) -> Vec<DeviceRecord> {
        self.records.values().cloned().collect()
    }

    /// Returns every cached identifier.
    #[must_use]
    pub fn ids(&self) -> Vec<DeviceId> {
        self.records.keys().cloned().collect()
    }

    /// Returns the number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BatteryLevel, LockState};

    fn id(s: &str) -> DeviceId {
        DeviceId::new(s).unwrap()
    }

    fn read(state: LockState) -> DeviceUpdate {
        DeviceUpdate::confirmed().with_lock_state(state)
    }

    #[test]
    fn upsert_creates_record() {
        let mut cache = DeviceCache::new();
        let changed = cache.upsert(
            &id("A"),
            read(LockState::Unsecured).with_battery(BatteryLevel::new(55).unwrap()),
        );

        assert!(!changed);
        let record = cache.get(&id("A")).unwrap();
        assert_eq!(record.lock_state(), LockState::Unsecured);
        assert_eq!(record.battery().map(|b| b.value()), Some(55));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_exactly_once_per_transition() {
        let mut cache = DeviceCache::new();
        let a = id("A");
        let reads = [
            LockState::Secured,
            LockState::Secured,
            LockState::Unsecured,
            LockState::Unsecured,
            LockState::Unsecured,
            LockState::Secured,
            LockState::Unsecured,
        ];

        let changes: Vec<bool> = reads.iter().map(|s| cache.upsert(&a, read(*s))).collect();
        assert_eq!(changes, vec![false, false, true, false, false, true, true]);
    }

    #[test]
    fn updates_without_lock_state_never_report_change() {
        let mut cache = DeviceCache::new();
        let a = id("A");
        cache.upsert(&a, read(LockState::Secured));
        assert!(!cache.upsert(&a, DeviceUpdate::confirmed().with_display_name("Sesame Door")));
        assert_eq!(cache.get(&a).unwrap().display_name(), "Sesame Door");
    }

    #[test]
    fn mark_unreachable_keeps_record() {
        let mut cache = DeviceCache::new();
        let a = id("A");
        cache.upsert(&a, read(LockState::Secured));

        assert!(cache.mark_unreachable(&a));
        assert!(cache.contains(&a));
        assert!(!cache.is_reachable(&a));
        assert!(!cache.mark_unreachable(&id("missing")));
    }

    #[test]
    fn remove_and_get() {
        let mut cache = DeviceCache::new();
        let a = id("A");
        cache.upsert(&a, read(LockState::Secured));

        assert!(cache.remove(&a).is_some());
        assert!(cache.get(&a).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn all_returns_every_record() {
        let mut cache = DeviceCache::new();
        cache.upsert(&id("A"), read(LockState::Secured));
        cache.upsert(&id("B"), read(LockState::Unsecured));

        let mut ids: Vec<String> = cache
            .all()
            .iter()
            .map(|r| r.device_id().to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn restore_seeds_unknown_records_only() {
        let mut cache = DeviceCache::new();
        cache.upsert(&id("A"), read(LockState::Unsecured));

        let mut stale = DeviceRecord::new(id("A"));
        stale.apply(read(LockState::Secured));
        assert!(!cache.restore(stale));
        assert_eq!(cache.get(&id("A")).unwrap().lock_state(), LockState::Unsecured);

        let mut restored = DeviceRecord::new(id("B"));
        restored.apply(DeviceUpdate::confirmed().with_reachable(false));
        assert!(cache.restore(restored));
        assert!(cache.is_reachable(&id("B")));
        assert_eq!(cache.len(), 2);
    }
}
