// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.
//!
//! [`BridgeConfig`] deserializes the platform block of the host's JSON
//! configuration:
//!
//! ```json
//! {
//!   "platform": "Sesame",
//!   "username": "me@example.com",
//!   "password": "secret",
//!   "longPoll": 300,
//!   "shortPoll": 5,
//!   "shortPollDuration": 120
//! }
//! ```
//!
//! Interval fields accept numbers or numeric strings. A missing, zero or
//! non-numeric interval falls back to its default.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::poll::PollConfig;
use crate::session::Credentials;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Settings for one bridge instance.
///
/// # Examples
///
/// ```
/// use sesame_bridge::BridgeConfig;
/// use std::time::Duration;
///
/// let config = BridgeConfig::from_json_str(
///     r#"{"platform": "Sesame", "username": "me@example.com", "password": "pw", "shortPoll": "10"}"#,
/// )
/// .unwrap();
///
/// let poll = config.poll_config();
/// assert_eq!(poll.short_interval(), Duration::from_secs(10));
/// assert_eq!(poll.long_interval(), Duration::from_secs(300));
/// assert!(config.credentials().is_ok());
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default, alias = "longPollIntervalSeconds", deserialize_with = "seconds")]
    long_poll: Option<u64>,
    #[serde(default, alias = "shortPollIntervalSeconds", deserialize_with = "seconds")]
    short_poll: Option<u64>,
    #[serde(default, alias = "shortPollDurationSeconds", deserialize_with = "seconds")]
    short_poll_duration: Option<u64>,
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default, deserialize_with = "seconds")]
    request_timeout_seconds: Option<u64>,
}

impl BridgeConfig {
    /// Creates an empty configuration with default intervals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the platform block of a host configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the text is not a valid block.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Json` if it does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Sets the account credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the long polling interval in seconds. Zero restores the default.
    #[must_use]
    pub fn with_long_poll(mut self, secs: u64) -> Self {
        self.long_poll = Some(secs).filter(|s| *s > 0);
        self
    }

    /// Sets the short polling interval in seconds. Zero restores the default.
    #[must_use]
    pub fn with_short_poll(mut self, secs: u64) -> Self {
        self.short_poll = Some(secs).filter(|s| *s > 0);
        self
    }

    /// Sets the short polling duration in seconds. Zero restores the default.
    #[must_use]
    pub fn with_short_poll_duration(mut self, secs: u64) -> Self {
        self.short_poll_duration = Some(secs).filter(|s| *s > 0);
        self
    }

    /// Points the bridge at a different API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout in seconds. Zero restores the default.
    #[must_use]
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_seconds = Some(secs).filter(|s| *s > 0);
        self
    }

    /// Returns the account e-mail, if set.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns true if both username and password are non-empty.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.credentials().is_ok()
    }

    /// Returns the login credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCredentials` if either value is missing
    /// or empty.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Ok(Credentials::new(user, pass))
            }
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    /// Returns the polling cadence.
    #[must_use]
    pub fn poll_config(&self) -> PollConfig {
        let secs = |value: Option<u64>, default: Duration| value.map_or(default, Duration::from_secs);
        PollConfig::new()
            .with_long_interval(secs(self.long_poll, PollConfig::DEFAULT_LONG_INTERVAL))
            .with_short_interval(secs(self.short_poll, PollConfig::DEFAULT_SHORT_INTERVAL))
            .with_short_duration(secs(
                self.short_poll_duration,
                PollConfig::DEFAULT_SHORT_DURATION,
            ))
    }

    /// Returns the API base URL override, if set.
    #[must_use]
    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Returns the HTTP transport settings.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn http_config(&self) -> crate::protocol::HttpConfig {
        let config = crate::protocol::HttpConfig::new().with_timeout(self.request_timeout());
        match &self.api_url {
            Some(url) => config.with_base_url(url.as_str()),
            None => config,
        }
    }

    /// Checks that the bridge can start with this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCredentials` or
    /// `ConfigError::InvalidInterval`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credentials()?;
        self.poll_config().validate()
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("poll", &self.poll_config())
            .field("api_url", &self.api_url)
            .field("request_timeout", &self.request_timeout())
            .finish()
    }
}

/// Reads a number of seconds given as a JSON number or a numeric string.
///
/// Fractions are truncated. Zero, negative and non-numeric values read as
/// unset.
fn seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Float(f64),
        Text(String),
        Other(serde_json::Value),
    }

    let value = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => u64::try_from(n).ok(),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(Raw::Float(f)) if f.is_finite() && f >= 1.0 => Some(f.trunc() as u64),
        Some(Raw::Float(_)) => None,
        Some(Raw::Other(value)) => {
            tracing::debug!(%value, "Ignoring non-numeric interval");
            None
        }
        Some(Raw::Text(text)) => {
            let digits: String = text
                .trim()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse().ok()
        }
        None => None,
    };
    Ok(value.filter(|secs| *secs > 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_intervals() {
        let config =
            BridgeConfig::from_json_str(r#"{"username": "u@example.com", "password": "p"}"#)
                .unwrap();
        assert_eq!(config.poll_config(), PollConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_host_field_names() {
        let config = BridgeConfig::from_json_str(
            r#"{"platform": "Sesame", "longPoll": 600, "shortPoll": "2", "shortPollDuration": 30}"#,
        )
        .unwrap();
        let poll = config.poll_config();
        assert_eq!(poll.long_interval(), Duration::from_secs(600));
        assert_eq!(poll.short_interval(), Duration::from_secs(2));
        assert_eq!(poll.max_short_poll_count(), 15);
    }

    #[test]
    fn reads_descriptive_field_names() {
        let config = BridgeConfig::from_json_str(
            r#"{"longPollIntervalSeconds": 60, "shortPollIntervalSeconds": 3, "shortPollDurationSeconds": 9}"#,
        )
        .unwrap();
        let poll = config.poll_config();
        assert_eq!(poll.long_interval(), Duration::from_secs(60));
        assert_eq!(poll.max_short_poll_count(), 3);
    }

    #[test]
    fn zero_and_garbage_fall_back_to_defaults() {
        let config = BridgeConfig::from_json_str(
            r#"{"longPoll": 0, "shortPoll": "fast", "shortPollDuration": -5}"#,
        )
        .unwrap();
        assert_eq!(config.poll_config(), PollConfig::default());
    }

    #[test]
    fn fractional_interval_is_truncated() {
        let config =
            BridgeConfig::from_json_str(r#"{"shortPoll": 2.5, "longPoll": 0.4}"#).unwrap();
        let poll = config.poll_config();
        assert_eq!(poll.short_interval(), Duration::from_secs(2));
        assert_eq!(poll.long_interval(), PollConfig::default().long_interval());
    }

    #[test]
    fn non_numeric_json_values_fall_back_to_defaults() {
        let config = BridgeConfig::from_json_str(
            r#"{"username": "u@example.com", "password": "p", "longPoll": true, "shortPoll": null, "shortPollDuration": [30]}"#,
        )
        .unwrap();
        assert_eq!(config.poll_config(), PollConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn numeric_string_with_suffix() {
        let config = BridgeConfig::from_json_str(r#"{"shortPoll": " 7s"}"#).unwrap();
        assert_eq!(config.poll_config().short_interval(), Duration::from_secs(7));
    }

    #[test]
    fn missing_credentials_rejected() {
        let config = BridgeConfig::new().with_credentials("u@example.com", "");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredentials)
        ));
        assert!(!BridgeConfig::new().has_credentials());
    }

    #[test]
    fn invalid_json_is_typed() {
        let result = BridgeConfig::from_json_str("{not json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = BridgeConfig::from_path("/nonexistent/sesame/config.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn builders_override_values() {
        let config = BridgeConfig::new()
            .with_long_poll(120)
            .with_short_poll(0)
            .with_api_url("http://127.0.0.1:9000/v1")
            .with_request_timeout(3);
        assert_eq!(config.poll_config().long_interval(), Duration::from_secs(120));
        assert_eq!(config.poll_config().short_interval(), Duration::from_secs(5));
        assert_eq!(config.api_url(), Some("http://127.0.0.1:9000/v1"));
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_config_uses_overrides() {
        let http = BridgeConfig::new()
            .with_api_url("http://127.0.0.1:9000/v1/")
            .with_request_timeout(4)
            .http_config();
        assert_eq!(http.base_url(), "http://127.0.0.1:9000/v1");
        assert_eq!(http.timeout(), Duration::from_secs(4));
    }

    #[test]
    fn debug_redacts_password() {
        let config = BridgeConfig::new().with_credentials("u@example.com", "hunter2");
        let debug = format!("{config:?}");
        assert!(debug.contains("u@example.com"));
        assert!(!debug.contains("hunter2"));
    }
}
