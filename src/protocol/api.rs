// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request and response bodies of the vendor endpoints.
//!
//! | Method | Path | Body | Success |
//! |--------|------|------|---------|
//! | `POST` | `/accounts/login` | [`LoginRequest`] | 200 [`LoginResponse`] |
//! | `GET` | `/sesames` | - | 200 [`SesameList`] |
//! | `GET` | `/sesames/{device_id}` | - | 200 [`SesameStatus`] |
//! | `POST` | `/sesames/{device_id}/control` | [`ControlRequest`] | 204 |

use std::collections::HashMap;

use serde::Deserialize;

use crate::types::{BatteryLevel, DeviceId, LockState};

/// Path of the login endpoint.
pub const LOGIN_PATH: &str = "/accounts/login";

/// Path of the device list endpoint.
pub const SESAMES_PATH: &str = "/sesames";

/// Path of a device detail endpoint.
#[must_use]
pub fn sesame_path(device_id: &DeviceId) -> String {
    format!("{SESAMES_PATH}/{}", urlencoding::encode(device_id.as_str()))
}

/// Path of a device control endpoint.
#[must_use]
pub fn control_path(device_id: &DeviceId) -> String {
    format!("{}/control", sesame_path(device_id))
}

/// Body of `POST /accounts/login`.
#[derive(Clone)]
pub struct LoginRequest<'a> {
    /// Account e-mail.
    pub email: &'a str,
    /// Account password.
    pub password: &'a str,
}

impl LoginRequest<'_> {
    /// Returns the JSON body.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "email": self.email, "password": self.password })
    }
}

impl std::fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// The session token.
    #[serde(default)]
    pub authorization: Option<String>,
}

/// Body of `GET /sesames`.
#[derive(Debug, Clone, Deserialize)]
pub struct SesameList {
    /// Locks on the account.
    #[serde(default)]
    pub sesames: SesameEntries,
}

/// The `sesames` field, sent either as an array or as an object keyed by
/// an opaque list key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SesameEntries {
    /// `[{...}, {...}]`
    List(Vec<SesameSummary>),
    /// `{"key": {...}}`
    Keyed(HashMap<String, SesameSummary>),
}

impl Default for SesameEntries {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl SesameEntries {
    /// Returns the number of listed locks.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(entries) => entries.len(),
            Self::Keyed(entries) => entries.len(),
        }
    }

    /// Returns true if no lock is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the listed locks, dropping list keys.
    #[must_use]
    pub fn into_summaries(self) -> Vec<SesameSummary> {
        match self {
            Self::List(entries) => entries,
            Self::Keyed(entries) => entries.into_values().collect(),
        }
    }
}

/// One entry of the device list.
#[derive(Debug, Clone, Deserialize)]
pub struct SesameSummary {
    /// User-assigned name.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Identifier used on the detail and control endpoints.
    pub device_id: DeviceId,
    /// Hardware serial, when the vendor reports one.
    #[serde(default)]
    pub serial: Option<String>,
}

/// Body of `GET /sesames/{device_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SesameStatus {
    /// User-assigned name.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Whether the bolt is retracted.
    pub is_unlocked: bool,
    /// Battery percentage.
    #[serde(default)]
    pub battery: Option<i64>,
}

impl SesameStatus {
    /// Returns the reported lock state.
    #[must_use]
    pub fn lock_state(&self) -> LockState {
        LockState::from_is_unlocked(self.is_unlocked)
    }

    /// Returns the reported battery level, clamped to 0-100.
    #[must_use]
    pub fn battery_level(&self) -> Option<BatteryLevel> {
        self.battery.map(BatteryLevel::clamped)
    }
}

/// Body of `POST /sesames/{device_id}/control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    /// `"lock"` or `"unlock"`, sent as `type`.
    pub kind: &'static str,
}

impl ControlRequest {
    /// Returns the JSON body.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "type": self.kind })
    }
}

impl From<LockState> for ControlRequest {
    fn from(target: LockState) -> Self {
        Self {
            kind: target.command(),
        }
    }
}
