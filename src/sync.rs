// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device discovery and state synchronization.
//!
//! One sync fetches the device list, then the detail of every listed lock,
//! and merges the results into the cache. The accessory layer is told
//! about new locks, refreshed locks and locks that disappeared.

use std::collections::HashSet;
use std::sync::Arc;

use crate::accessory::AccessoryBinding;
use crate::cache::{DEFAULT_MODEL, DeviceUpdate, SharedCache};
use crate::error::FetchError;
use crate::poll::{RefreshOutcome, Refresher};
use crate::protocol::api::{SESAMES_PATH, SesameList, SesameStatus, SesameSummary, sesame_path};
use crate::protocol::{ApiRequest, ApiResponse, Transport};
use crate::session::SessionManager;
use crate::types::DeviceId;

/// Pulls vendor state into the device cache.
pub struct Synchronizer<T: Transport, B: AccessoryBinding> {
    session: Arc<SessionManager<T>>,
    cache: SharedCache,
    binding: Arc<B>,
}

impl<T: Transport, B: AccessoryBinding> Synchronizer<T, B> {
    /// Creates a synchronizer over shared components.
    pub fn new(session: Arc<SessionManager<T>>, cache: SharedCache, binding: Arc<B>) -> Self {
        Self {
            session,
            cache,
            binding,
        }
    }

    /// Fetches every device and merges it into the cache.
    ///
    /// Returns `true` if any cached lock changed state. Locks missing from
    /// the list are marked unreachable and removed from the host.
    ///
    /// # Errors
    ///
    /// Returns the first failed fetch. Devices merged before the failure
    /// stay merged.
    pub async fn sync_devices(&self) -> Result<bool, FetchError> {
        let mut listed: Vec<SesameSummary> = self
            .get(ApiRequest::get(SESAMES_PATH), SESAMES_PATH)
            .await?
            .parse::<SesameList>()?
            .sesames
            .into_summaries();
        listed.sort_by(|a, b| a.device_id.cmp(&b.device_id));

        tracing::debug!(count = listed.len(), "Fetched device list");

        let mut changed = false;
        for summary in &listed {
            let path = sesame_path(&summary.device_id);
            let status: SesameStatus = self.get(ApiRequest::get(&path), &path).await?.parse()?;
            changed |= self.merge(summary, &status);
        }

        let seen: HashSet<&DeviceId> = listed.iter().map(|s| &s.device_id).collect();
        self.drop_missing(&seen);

        Ok(changed)
    }

    async fn get(&self, request: ApiRequest, endpoint: &str) -> Result<ApiResponse, FetchError> {
        let response = self.session.send::<FetchError>(request).await?;
        if response.status() != 200 {
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    /// Merges one device detail. Returns true if the lock state changed.
    fn merge(&self, summary: &SesameSummary, status: &SesameStatus) -> bool {
        let device_id = &summary.device_id;
        let nickname = status
            .nickname
            .as_deref()
            .or(summary.nickname.as_deref())
            .unwrap_or(device_id.as_str());

        let mut update = DeviceUpdate::confirmed()
            .with_serial_number(summary.serial.as_deref().unwrap_or(device_id.as_str()))
            .with_model(DEFAULT_MODEL)
            .with_display_name(format!("{DEFAULT_MODEL} {nickname}"))
            .with_lock_state(status.lock_state())
            .with_reachable(true);
        if let Some(battery) = status.battery_level() {
            update = update.with_battery(battery);
        }

        let (changed, revived, record) = {
            let mut cache = self.cache.lock();
            let revived = !cache.is_reachable(device_id);
            let changed = cache.upsert(device_id, update);
            (changed, revived, cache.get(device_id))
        };
        let Some(record) = record else {
            return changed;
        };

        if revived {
            tracing::info!(device_id = %device_id, name = record.display_name(), "Discovered Sesame");
            self.binding.register_device(&record);
        } else {
            self.binding.reflect_state(&record);
        }

        if changed {
            tracing::info!(
                device_id = %device_id,
                state = %record.lock_state(),
                "Lock state changed"
            );
        }
        changed
    }

    fn drop_missing(&self, seen: &HashSet<&DeviceId>) {
        let missing: Vec<DeviceId> = {
            let mut cache = self.cache.lock();
            let missing: Vec<DeviceId> = cache
                .ids()
                .into_iter()
                .filter(|id| !seen.contains(id) && cache.is_reachable(id))
                .collect();
            for id in &missing {
                cache.mark_unreachable(id);
            }
            missing
        };

        for id in &missing {
            tracing::warn!(device_id = %id, "Sesame no longer listed, removing accessory");
            self.binding.remove_device(id);
        }
    }
}

impl<T: Transport, B: AccessoryBinding> Refresher for Synchronizer<T, B> {
    async fn refresh(&self, needs_login: bool) -> RefreshOutcome {
        if (needs_login || !self.session.is_valid()) && self.session.login().await.is_err() {
            return RefreshOutcome::Failed;
        }

        match self.sync_devices().await {
            Ok(changed) => RefreshOutcome::Synced { changed },
            Err(e) => {
                tracing::warn!(error = %e, "Device refresh failed");
                RefreshOutcome::Failed
            }
        }
    }
}

impl<T: Transport, B: AccessoryBinding> std::fmt::Debug for Synchronizer<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
