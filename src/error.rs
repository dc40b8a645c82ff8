// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Sesame bridge.
//!
//! Failures are split by where they happen: the transport, the login
//! exchange, device reads, lock commands, payload parsing and configuration.
//! The polling loop absorbs auth and fetch errors; command errors are handed
//! back to whoever asked for the lock change.

use thiserror::Error;

use crate::types::DeviceId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Logging in or keeping the session alive failed.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Reading the device list or a device detail failed.
    #[error("device fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A lock or unlock command was not confirmed.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// A response body could not be interpreted.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A value failed validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The bridge configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The device is not present in the cache.
    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),
}

/// Errors raised below HTTP: connection failures, timeouts, bad addresses.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the vendor API failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors from the login exchange or from a token the vendor no longer accepts.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The vendor answered the login with a non-200 status.
    #[error("login rejected with HTTP {0}")]
    Rejected(u16),

    /// The login request did not get a response.
    #[error("login request failed: {0}")]
    Transport(#[from] TransportError),

    /// The login response body was malformed.
    #[error("malformed login response: {0}")]
    Parse(#[from] ParseError),

    /// The login succeeded but carried no usable token.
    #[error("login response did not contain an authorization token")]
    MissingToken,

    /// No login has succeeded since the session was last invalidated.
    #[error("no valid session")]
    NotLoggedIn,

    /// A request was answered with 401; the token is no longer valid.
    #[error("session token expired or was revoked")]
    Expired,
}

/// Errors while reading devices from the vendor.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The endpoint answered with a non-200 status.
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        /// The request path.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request did not get a response.
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),

    /// The response body was malformed.
    #[error("malformed response: {0}")]
    Parse(#[from] ParseError),

    /// The session was not valid or expired mid-request.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Errors from the lock control endpoint.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The control endpoint answered with something other than 204.
    #[error("command for {device_id} rejected with HTTP {status}")]
    Rejected {
        /// The device the command targeted.
        device_id: DeviceId,
        /// The HTTP status code.
        status: u16,
    },

    /// The control request did not get a response.
    #[error("command request failed: {0}")]
    Transport(#[from] TransportError),

    /// No valid session could be established before sending.
    #[error("not authenticated: {0}")]
    Auth(#[from] AuthError),
}

/// Errors related to parsing vendor responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to interpret a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// An unknown lock state string was provided.
    #[error("invalid lock state: {0}")]
    InvalidLockState(String),

    /// A device identifier was empty.
    #[error("device identifier must not be empty")]
    EmptyDeviceId,
}

/// Errors related to loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Username or password is missing.
    #[error("username and password must both be set")]
    MissingCredentials,

    /// A polling interval is zero.
    #[error("{0} must be greater than zero")]
    InvalidInterval(&'static str),

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON for this bridge.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

impl FetchError {
    /// Returns true if the failure means the session must be re-established.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
