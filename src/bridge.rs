// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Sesame platform: session, cache, poller and dispatcher in one place.

use std::sync::Arc;

use crate::accessory::AccessoryBinding;
use crate::cache::{DeviceCache, DeviceRecord, SharedCache};
use crate::config::BridgeConfig;
use crate::dispatch::CommandDispatcher;
use crate::error::{Error, Result};
use crate::poll::{PollState, PollingController, RefreshOutcome};
use crate::protocol::Transport;
use crate::session::SessionManager;
use crate::sync::Synchronizer;
use crate::types::{DeviceId, LockState};

/// Bridges Sesame locks on a CANDY HOUSE account into a host's accessories.
///
/// # Examples
///
/// ```no_run
/// use sesame_bridge::{BridgeConfig, SesameBridge};
/// use sesame_bridge::accessory::{AccessoryEvent, EventBus};
/// use sesame_bridge::types::LockState;
///
/// # async fn example() -> sesame_bridge::Result<()> {
/// let config = BridgeConfig::new().with_credentials("me@example.com", "secret");
/// let bus = EventBus::new();
/// let mut events = bus.subscribe();
///
/// let bridge = SesameBridge::connect(config, bus)?;
/// bridge.start().await;
///
/// while let Ok(event) = events.recv().await {
///     if let AccessoryEvent::Registered { record } = event {
///         bridge.on_user_set_target(record.device_id(), LockState::Secured).await?;
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct SesameBridge<T: Transport, B: AccessoryBinding> {
    config: BridgeConfig,
    session: Arc<SessionManager<T>>,
    cache: SharedCache,
    binding: Arc<B>,
    sync: Arc<Synchronizer<T, B>>,
    poller: Arc<PollingController>,
    dispatcher: CommandDispatcher<T, B>,
}

#[cfg(feature = "http")]
impl<B: AccessoryBinding> SesameBridge<crate::protocol::HttpTransport, B> {
    /// Creates a bridge talking to the vendor API over HTTP.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is unusable or the HTTP client
    /// cannot be built.
    pub fn connect(config: BridgeConfig, binding: B) -> Result<Self> {
        let transport = config.http_config().into_transport()?;
        Self::new(config, transport, binding)
    }
}

impl<T: Transport, B: AccessoryBinding> SesameBridge<T, B> {
    /// Creates a stopped bridge.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCredentials` if username or password is
    /// not set and `ConfigError::InvalidInterval` for a zero interval.
    pub fn new(config: BridgeConfig, transport: T, binding: B) -> Result<Self> {
        let credentials = config.credentials().inspect_err(|_| {
            tracing::error!("Please make sure the Sesame login information is set!");
        })?;
        let poll_config = config.poll_config();
        poll_config.validate()?;

        let session = Arc::new(SessionManager::new(transport, credentials));
        let cache = DeviceCache::shared();
        let binding = Arc::new(binding);
        let poller = Arc::new(PollingController::new(poll_config));
        let sync = Arc::new(Synchronizer::new(
            Arc::clone(&session),
            Arc::clone(&cache),
            Arc::clone(&binding),
        ));
        let dispatcher = CommandDispatcher::new(
            Arc::clone(&session),
            Arc::clone(&cache),
            Arc::clone(&poller),
            Arc::clone(&binding),
        );

        Ok(Self {
            config,
            session,
            cache,
            binding,
            sync,
            poller,
            dispatcher,
        })
    }

    /// Seeds locks the host restored from its own storage.
    ///
    /// Call before [`start`](Self::start). The first device list then
    /// reflects restored locks that are still on the account and removes
    /// the ones that are gone, instead of registering everything anew.
    /// Returns how many records were seeded; locks already cached are
    /// skipped.
    pub fn restore(&self, records: impl IntoIterator<Item = DeviceRecord>) -> usize {
        let mut cache = self.cache.lock();
        let mut restored = 0;
        for record in records {
            let device_id = record.device_id().clone();
            if cache.restore(record) {
                tracing::debug!(device_id = %device_id, "Restored accessory from host cache");
                restored += 1;
            }
        }
        restored
    }

    /// Logs in, discovers devices and starts polling.
    ///
    /// A failed first refresh is logged and retried by the poller.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub async fn start(&self) -> RefreshOutcome {
        tracing::info!(username = self.config.username(), "Starting Sesame bridge");

        let outcome = self.poller.refresh_now(self.sync.as_ref()).await;
        match outcome {
            RefreshOutcome::Synced { .. } => {
                tracing::info!(devices = self.cache.lock().len(), "Initial discovery complete");
            }
            RefreshOutcome::Failed => {
                tracing::warn!("Initial discovery failed, polling will retry");
            }
        }

        self.poller.start(Arc::clone(&self.sync));
        outcome
    }

    /// Stops polling. Cached state stays readable.
    pub fn stop(&self) {
        self.poller.stop();
    }

    /// Runs one refresh cycle now.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.poller.refresh_now(self.sync.as_ref()).await
    }

    /// Handles a user request to lock or unlock.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown lock and
    /// `Error::Command` if the vendor did not confirm the command.
    pub async fn on_user_set_target(
        &self,
        device_id: &DeviceId,
        target: LockState,
    ) -> Result<LockState> {
        if !self.cache.lock().contains(device_id) {
            return Err(Error::DeviceNotFound(device_id.clone()));
        }
        Ok(self.dispatcher.set_lock_state(device_id, target).await?)
    }

    /// Returns the cached lock state without touching the network.
    pub fn current_state(&self, device_id: &DeviceId) -> Option<LockState> {
        self.cache
            .lock()
            .get(device_id)
            .map(|record| record.lock_state())
    }

    /// Handles an identify request from the host.
    ///
    /// Sesame locks have no identify action, so the request is only logged.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown lock.
    pub fn identify(&self, device_id: &DeviceId) -> Result<()> {
        let record = self
            .device(device_id)
            .ok_or_else(|| Error::DeviceNotFound(device_id.clone()))?;
        tracing::info!(device_id = %device_id, name = record.display_name(), "Identify requested");
        Ok(())
    }

    /// Returns a copy of a cached record.
    pub fn device(&self, device_id: &DeviceId) -> Option<DeviceRecord> {
        self.cache.lock().get(device_id)
    }

    /// Returns a copy of every cached record.
    pub fn devices(&self) -> Vec<DeviceRecord> {
        self.cache.lock().all()
    }

    /// Returns the poll scheduling state.
    pub fn poll_state(&self) -> PollState {
        self.poller.snapshot()
    }

    /// Returns true while polling is running.
    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    /// Returns true if a session token is held.
    pub fn is_logged_in(&self) -> bool {
        self.session.is_valid()
    }

    /// Returns the accessory binding.
    pub fn binding(&self) -> &B {
        &self.binding
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl<T: Transport, B: AccessoryBinding> std::fmt::Debug for SesameBridge<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesameBridge")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("devices", &self.cache.lock().len())
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}
