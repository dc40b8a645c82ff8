// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock and unlock commands.
//!
//! A command is only confirmed by HTTP 204 from the control endpoint. On
//! confirmation the cache takes the requested state as a provisional value
//! and polling is accelerated so the next reads confirm it. Any other
//! answer means the lock is treated as gone until a later device list
//! brings it back.

use std::sync::Arc;

use crate::accessory::AccessoryBinding;
use crate::cache::{DeviceUpdate, SharedCache};
use crate::error::{AuthError, CommandError};
use crate::poll::PollingController;
use crate::protocol::api::{ControlRequest, control_path};
use crate::protocol::{ApiRequest, ApiResponse, Transport};
use crate::session::SessionManager;
use crate::types::{DeviceId, LockState};

/// Status the control endpoint answers an accepted command with.
const CONFIRMED_STATUS: u16 = 204;

/// Sends lock commands and records their effect.
pub struct CommandDispatcher<T: Transport, B: AccessoryBinding> {
    session: Arc<SessionManager<T>>,
    cache: SharedCache,
    poller: Arc<PollingController>,
    binding: Arc<B>,
}

impl<T: Transport, B: AccessoryBinding> CommandDispatcher<T, B> {
    /// Creates a dispatcher over shared components.
    pub fn new(
        session: Arc<SessionManager<T>>,
        cache: SharedCache,
        poller: Arc<PollingController>,
        binding: Arc<B>,
    ) -> Self {
        Self {
            session,
            cache,
            poller,
            binding,
        }
    }

    /// Asks the vendor to move a lock to `target`.
    ///
    /// The session is validated first, logging in if needed. A token that
    /// the control endpoint rejects with 401 is renewed once and the
    /// command resent. On 204 the cache holds `target` before this returns.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Auth` if logging in failed; the lock is left
    /// untouched. Any failure after the command was sent, a second 401 or a
    /// failed re-login included, marks the lock unreachable and removes it
    /// from the host.
    pub async fn set_lock_state(
        &self,
        device_id: &DeviceId,
        target: LockState,
    ) -> Result<LockState, CommandError> {
        tracing::debug!(device_id = %device_id, target = %target, "Sending lock command");

        self.session.ensure_authenticated().await?;

        let response = match self.send(device_id, target).await {
            Err(CommandError::Auth(AuthError::Expired)) => {
                tracing::info!(device_id = %device_id, "Token expired, logging in again");
                match self.session.login().await {
                    Ok(_) => self.send(device_id, target).await,
                    Err(e) => Err(e.into()),
                }
            }
            other => other,
        };

        let confirmed = response.and_then(|response| {
            if response.status() == CONFIRMED_STATUS {
                Ok(())
            } else {
                Err(CommandError::Rejected {
                    device_id: device_id.clone(),
                    status: response.status(),
                })
            }
        });

        if let Err(e) = confirmed {
            self.device_lost(device_id, &e);
            return Err(e);
        }

        self.confirm(device_id, target);
        self.poller.accelerate();
        tracing::info!(device_id = %device_id, state = %target, "Lock state was successfully set");
        Ok(target)
    }

    async fn send(
        &self,
        device_id: &DeviceId,
        target: LockState,
    ) -> Result<ApiResponse, CommandError> {
        let request = ApiRequest::post(
            control_path(device_id),
            ControlRequest::from(target).to_json(),
        );
        self.session.send(request).await
    }

    fn confirm(&self, device_id: &DeviceId, target: LockState) {
        let (revived, record) = {
            let mut cache = self.cache.lock();
            let revived = !cache.is_reachable(device_id);
            cache.upsert(
                device_id,
                DeviceUpdate::provisional()
                    .with_lock_state(target)
                    .with_reachable(true),
            );
            (revived, cache.get(device_id))
        };

        if let Some(record) = record {
            if revived {
                self.binding.register_device(&record);
            } else {
                self.binding.reflect_state(&record);
            }
        }
    }

    fn device_lost(&self, device_id: &DeviceId, error: &CommandError) {
        tracing::warn!(
            device_id = %device_id,
            error = %error,
            "Error setting lock state, removing accessory"
        );
        self.cache.lock().mark_unreachable(device_id);
        self.binding.remove_device(device_id);
    }
}

impl<T: Transport, B: AccessoryBinding> std::fmt::Debug for CommandDispatcher<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("session", &self.session)
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}
