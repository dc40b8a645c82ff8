// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast-channel accessory binding.

use tokio::sync::broadcast;

use crate::cache::DeviceRecord;
use crate::types::DeviceId;

use super::{AccessoryBinding, AccessoryEvent};

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// [`AccessoryBinding`] that publishes every call as an [`AccessoryEvent`].
///
/// A slow subscriber that falls more than the channel capacity behind
/// loses the oldest events (`RecvError::Lagged`).
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AccessoryEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to accessory events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AccessoryEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    pub fn publish(&self, event: AccessoryEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessoryBinding for EventBus {
    fn register_device(&self, record: &DeviceRecord) {
        self.publish(AccessoryEvent::Registered {
            record: record.clone(),
        });
    }

    fn reflect_state(&self, record: &DeviceRecord) {
        self.publish(AccessoryEvent::StateReflected {
            record: record.clone(),
        });
    }

    fn remove_device(&self, device_id: &DeviceId) {
        self.publish(AccessoryEvent::Removed {
            device_id: device_id.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DeviceRecord {
        DeviceRecord::new(DeviceId::new("SESAME-1").unwrap())
    }

    #[test]
    fn subscribe_increments_count() {
        let bus = EventBus::new();
        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::with_capacity(4);
        bus.remove_device(&DeviceId::new("A").unwrap());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn binding_calls_become_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let record = record();

        bus.register_device(&record);
        bus.reflect_state(&record);
        bus.remove_device(record.device_id());

        assert!(matches!(rx.recv().await.unwrap(), AccessoryEvent::Registered { .. }));
        assert!(matches!(rx.recv().await.unwrap(), AccessoryEvent::StateReflected { .. }));
        match rx.recv().await.unwrap() {
            AccessoryEvent::Removed { device_id } => assert_eq!(&device_id, record.device_id()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn clone_shares_same_channel() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();
        let _rx = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
