// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::protocol::{ApiRequest, ApiResponse, Method, Transport};

type Reply = Result<ApiResponse, String>;

#[derive(Debug, Default)]
struct Routes {
    /// Replies per route; the last reply is repeated once the queue drains.
    replies: HashMap<(Method, String), VecDeque<Reply>>,
    requests: Vec<ApiRequest>,
}

/// Transport answering from per-route reply queues and recording requests.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    routes: Arc<Mutex<Routes>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues a response for a route.
    pub(crate) fn reply(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        let body = if body.is_null() {
            String::new()
        } else {
            body.to_string()
        };
        self.push(method, path, Ok(ApiResponse::new(status, body)));
    }

    /// Queues a transport failure for a route.
    pub(crate) fn fail(&self, method: Method, path: &str) {
        self.push(method, path, Err("connection refused".to_string()));
    }

    /// Drops every queued reply for a route.
    pub(crate) fn clear(&self, method: Method, path: &str) {
        self.routes
            .lock()
            .replies
            .remove(&(method, path.to_string()));
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.routes
            .lock()
            .replies
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Returns every request sent so far.
    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.routes.lock().requests.clone()
    }

    /// Returns how many requests hit a route.
    pub(crate) fn count(&self, method: Method, path: &str) -> usize {
        self.routes
            .lock()
            .requests
            .iter()
            .filter(|r| r.method() == method && r.path() == path)
            .count()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let key = (request.method(), request.path().to_string());
        let mut routes = self.routes.lock();
        routes.requests.push(request);

        let reply = match routes.replies.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::ConnectionFailed(message)),
            None => Ok(ApiResponse::new(404, "")),
        }
    }
}
