// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Login state and authenticated requests.
//!
//! [`SessionManager`] is the only owner of the session token. It attaches
//! the token to outgoing requests and drops it on the first 401, so every
//! later call has to go through [`SessionManager::login`] again.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{AuthError, TransportError};
use crate::protocol::api::{LOGIN_PATH, LoginRequest, LoginResponse};
use crate::protocol::{ApiRequest, ApiResponse, Transport};

/// Account credentials, fixed for the life of the bridge.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from an account e-mail and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the account e-mail.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Snapshot of the login state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    valid: bool,
}

impl Session {
    /// Returns true if authenticated requests may be attempted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid && self.token.is_some()
    }

    /// Returns the current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Owns the session token and performs authenticated requests.
///
/// # Examples
///
/// ```no_run
/// use sesame_bridge::protocol::HttpTransport;
/// use sesame_bridge::session::{Credentials, SessionManager};
///
/// # async fn example() -> sesame_bridge::Result<()> {
/// let session = SessionManager::new(
///     HttpTransport::new()?,
///     Credentials::new("me@example.com", "secret"),
/// );
/// session.ensure_authenticated().await?;
/// assert!(session.is_valid());
/// # Ok(())
/// # }
/// ```
pub struct SessionManager<T: Transport> {
    transport: Arc<T>,
    credentials: Credentials,
    session: Mutex<Session>,
}

impl<T: Transport> SessionManager<T> {
    /// Creates a session manager that has not logged in yet.
    pub fn new(transport: T, credentials: Credentials) -> Self {
        Self::with_shared_transport(Arc::new(transport), credentials)
    }

    /// Creates a session manager over a transport shared with other owners.
    pub fn with_shared_transport(transport: Arc<T>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            session: Mutex::new(Session::default()),
        }
    }

    /// Returns true if a token is held and has not been invalidated.
    pub fn is_valid(&self) -> bool {
        self.session.lock().is_valid()
    }

    /// Returns a snapshot of the session.
    pub fn session(&self) -> Session {
        self.session.lock().clone()
    }

    /// Returns the credentials used for login.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Logs in and stores the returned token.
    ///
    /// On success the token is attached to every later request until the
    /// session is invalidated.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the vendor does not answer, answers with a
    /// status other than 200, or returns no token. The session is left
    /// invalid in every error case.
    pub async fn login(&self) -> Result<String, AuthError> {
        tracing::info!(username = %self.credentials.username, "Attempting to login to CANDY HOUSE");

        let body = LoginRequest {
            email: &self.credentials.username,
            password: &self.credentials.password,
        }
        .to_json();

        match self.exchange(ApiRequest::post(LOGIN_PATH, body)).await {
            Ok(token) => {
                {
                    let mut session = self.session.lock();
                    session.token = Some(token.clone());
                    session.valid = true;
                }
                tracing::info!(username = %self.credentials.username, "Logged in to CANDY HOUSE");
                Ok(token)
            }
            Err(e) => {
                self.invalidate();
                match &e {
                    AuthError::Rejected(status) => tracing::warn!(
                        status,
                        "Login rejected: credential issue, API throttling or server downtime"
                    ),
                    other => tracing::warn!(error = %other, "Login failed"),
                }
                Err(e)
            }
        }
    }

    async fn exchange(&self, request: ApiRequest) -> Result<String, AuthError> {
        let response = self.transport.send(request).await?;
        if response.status() != 200 {
            return Err(AuthError::Rejected(response.status()));
        }
        response
            .parse::<LoginResponse>()?
            .authorization
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)
    }

    /// Logs in unless the session is already valid.
    ///
    /// # Errors
    ///
    /// Returns the login error if a login was needed and failed.
    pub async fn ensure_authenticated(&self) -> Result<(), AuthError> {
        if self.is_valid() {
            return Ok(());
        }
        self.login().await.map(|_| ())
    }

    /// Marks the session invalid; the next authenticated call needs a login.
    pub fn invalidate(&self) {
        let mut session = self.session.lock();
        if session.valid {
            tracing::debug!("Session invalidated");
        }
        session.valid = false;
    }

    /// Sends a request carrying the session token.
    ///
    /// A 401 answer invalidates the session and is reported as
    /// `AuthError::Expired`; every other status is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns an auth error if no valid session is held or the token was
    /// rejected, and a transport error if the request failed.
    pub async fn send<E>(&self, request: ApiRequest) -> Result<ApiResponse, E>
    where
        E: From<AuthError> + From<TransportError>,
    {
        let token = {
            let session = self.session.lock();
            match (&session.token, session.valid) {
                (Some(token), true) => token.clone(),
                _ => return Err(AuthError::NotLoggedIn.into()),
            }
        };

        let response = self.transport.send(request.with_token(token)).await?;
        if response.is_unauthorized() {
            tracing::warn!("Vendor rejected the session token");
            self.invalidate();
            return Err(AuthError::Expired.into());
        }
        Ok(response)
    }
}

impl<T: Transport> fmt::Debug for SessionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.credentials)
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::protocol::Method;
    use crate::protocol::mock::MockTransport;

    fn manager(transport: &MockTransport) -> SessionManager<MockTransport> {
        SessionManager::new(transport.clone(), Credentials::new("me@example.com", "secret"))
    }

    #[tokio::test]
    async fn login_stores_token() {
        let transport = MockTransport::new();
        transport.reply(
            Method::Post,
            LOGIN_PATH,
            200,
            serde_json::json!({"authorization": "tok-1"}),
        );
        let session = manager(&transport);

        let token = session.login().await.unwrap();
        assert_eq!(token, "tok-1");
        assert!(session.is_valid());
        assert_eq!(session.session().token(), Some("tok-1"));

        let sent = &transport.requests()[0];
        assert_eq!(
            sent.body().unwrap(),
            &serde_json::json!({"email": "me@example.com", "password": "secret"})
        );
        assert!(sent.token().is_none());
    }

    #[tokio::test]
    async fn login_rejected_leaves_session_invalid() {
        let transport = MockTransport::new();
        transport.reply(Method::Post, LOGIN_PATH, 403, serde_json::Value::Null);
        let session = manager(&transport);

        let err = session.login().await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(403)));
        assert!(!session.is_valid());
    }

    #[tokio::test]
    async fn login_transport_failure_is_typed() {
        let transport = MockTransport::new();
        transport.fail(Method::Post, LOGIN_PATH);
        let session = manager(&transport);

        let err = session.login().await.unwrap_err();
        assert!(matches!(err, AuthError::Transport(_)));
    }

    #[tokio::test]
    async fn login_without_token_fails() {
        let transport = MockTransport::new();
        transport.reply(Method::Post, LOGIN_PATH, 200, serde_json::json!({}));
        let session = manager(&transport);

        assert!(matches!(session.login().await, Err(AuthError::MissingToken)));
        assert!(!session.is_valid());
    }

    #[tokio::test]
    async fn ensure_authenticated_skips_login_when_valid() {
        let transport = MockTransport::new();
        transport.reply(
            Method::Post,
            LOGIN_PATH,
            200,
            serde_json::json!({"authorization": "tok"}),
        );
        let session = manager(&transport);

        session.ensure_authenticated().await.unwrap();
        session.ensure_authenticated().await.unwrap();
        assert_eq!(transport.count(Method::Post, LOGIN_PATH), 1);
    }

    #[tokio::test]
    async fn send_requires_valid_session() {
        let transport = MockTransport::new();
        let session = manager(&transport);

        let result: Result<_, FetchError> = session.send(ApiRequest::get("/sesames")).await;
        assert!(matches!(result, Err(FetchError::Auth(AuthError::NotLoggedIn))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn send_attaches_token_and_invalidates_on_401() {
        let transport = MockTransport::new();
        transport.reply(
            Method::Post,
            LOGIN_PATH,
            200,
            serde_json::json!({"authorization": "tok"}),
        );
        transport.reply(Method::Get, "/sesames", 401, serde_json::Value::Null);
        let session = manager(&transport);
        session.login().await.unwrap();

        let result: Result<_, FetchError> = session.send(ApiRequest::get("/sesames")).await;
        assert!(matches!(result, Err(FetchError::Auth(AuthError::Expired))));
        assert!(!session.is_valid());

        let sent = transport.requests();
        assert_eq!(sent[1].token(), Some("tok"));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new("me@example.com", "secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("secret"));
    }
}
