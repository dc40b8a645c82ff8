// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sesame Bridge - mirror CANDY HOUSE Sesame cloud locks into a
//! home-automation accessory model.
//!
//! The bridge logs in to the vendor API, discovers the locks on the
//! account, keeps their lock and battery state in an in-memory cache and
//! relays lock/unlock requests from the host back to the API.
//!
//! # Features
//!
//! - **Adaptive polling**: a long interval at rest, a short interval for a
//!   while after any activity
//! - **Self-healing session**: expired tokens are dropped and the next
//!   refresh logs in again
//! - **Confirmed commands**: a lock command only succeeds on HTTP 204, and
//!   a failed command removes the lock until it is rediscovered
//! - **Host-agnostic accessories**: the host implements
//!   [`AccessoryBinding`](accessory::AccessoryBinding) or subscribes to the
//!   ready-made [`EventBus`](accessory::EventBus)
//!
//! # Quick Start
//!
//! ```no_run
//! use sesame_bridge::{BridgeConfig, SesameBridge};
//! use sesame_bridge::accessory::{AccessoryEvent, EventBus};
//!
//! #[tokio::main]
//! async fn main() -> sesame_bridge::Result<()> {
//!     let config = BridgeConfig::from_path("config.json")?;
//!     let bus = EventBus::new();
//!     let mut events = bus.subscribe();
//!
//!     let bridge = SesameBridge::connect(config, bus)?;
//!     bridge.start().await;
//!
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             AccessoryEvent::Registered { record } => {
//!                 println!("Added {} ({})", record.display_name(), record.device_id());
//!             }
//!             AccessoryEvent::StateReflected { record } => {
//!                 println!("{} is {}", record.display_name(), record.lock_state());
//!             }
//!             AccessoryEvent::Removed { device_id } => println!("Removed {device_id}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod accessory;
mod bridge;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod poll;
pub mod protocol;
pub mod session;
pub mod sync;
pub mod types;

pub use bridge::SesameBridge;
pub use config::BridgeConfig;
pub use error::{
    AuthError, CommandError, ConfigError, Error, FetchError, ParseError, Result, TransportError,
    ValueError,
};
#[cfg(feature = "http")]
pub use protocol::{HttpConfig, HttpTransport};
pub use types::{BatteryLevel, DeviceId, LockState, LowBattery};
