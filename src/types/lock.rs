// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock mechanism state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Represents the state of a lock mechanism.
///
/// The vendor reports `is_unlocked` as a boolean and accepts `"lock"` or
/// `"unlock"` as control commands; this type maps between both.
///
/// # Examples
///
/// ```
/// use sesame_bridge::types::LockState;
///
/// let state = LockState::from_is_unlocked(false);
/// assert_eq!(state, LockState::Secured);
/// assert_eq!(state.command(), "lock");
/// assert_eq!(LockState::Unsecured.command(), "unlock");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    /// The bolt is thrown.
    Secured,
    /// The bolt is retracted.
    Unsecured,
}

impl LockState {
    /// Maps the vendor's `is_unlocked` flag to a lock state.
    #[must_use]
    pub const fn from_is_unlocked(is_unlocked: bool) -> Self {
        if is_unlocked {
            Self::Unsecured
        } else {
            Self::Secured
        }
    }

    /// Returns the control command that drives the lock into this state.
    #[must_use]
    pub const fn command(&self) -> &'static str {
        match self {
            Self::Secured => "lock",
            Self::Unsecured => "unlock",
        }
    }

    /// Returns the canonical name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Secured => "SECURED",
            Self::Unsecured => "UNSECURED",
        }
    }

    /// Returns true if the lock is secured.
    #[must_use]
    pub const fn is_secured(&self) -> bool {
        matches!(self, Self::Secured)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SECURED" | "LOCK" | "LOCKED" => Ok(Self::Secured),
            "UNSECURED" | "UNLOCK" | "UNLOCKED" => Ok(Self::Unsecured),
            _ => Err(ValueError::InvalidLockState(s.to_string())),
        }
    }
}
