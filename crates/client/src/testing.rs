// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{collections::HashMap, sync::Mutex, time::Duration};

use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};

/// Answers requests from canned responses keyed by path and records every
/// request it sees. Unknown paths answer 404.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, (u16, String)>>,
    requests: Mutex<Vec<ApiRequest>>,
    offline: bool,
    latency: Duration,
}

impl FakeTransport {
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }

    /// Every request waits this long before it is answered.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn respond(self, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    pub fn set_response(&self, path: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    fn host(&self) -> &str {
        "http://fake.test"
    }

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.offline {
            return Err(TransportError("connection refused".to_string()));
        }
        let responses = self.responses.lock().unwrap();
        let (status, body) = responses
            .get(&request.path)
            .cloned()
            .unwrap_or((404, String::new()));
        Ok(ApiResponse {
            status,
            body: body.into_bytes(),
        })
    }
}
