//! In-memory transport for tests and demos.
//!
//! Serves a fixed URI-to-document map and counts GETs per URI so tests can
//! assert how many times the backend was actually hit.

use super::{RedfishTransport, Response, TransportError, TransportResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockTransport {
    root_uri: String,
    resources: Mutex<HashMap<String, Value>>,
    get_counts: Mutex<HashMap<String, usize>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            root_uri: "/redfish/v1".to_string(),
            resources: Mutex::new(HashMap::new()),
            get_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Register or replace the document served at `uri`.
    pub fn add_resource(&self, uri: impl Into<String>, body: Value) {
        let mut resources = self.resources.lock().unwrap_or_else(|e| e.into_inner());
        resources.insert(uri.into(), body);
    }

    pub fn remove_resource(&self, uri: &str) {
        let mut resources = self.resources.lock().unwrap_or_else(|e| e.into_inner());
        resources.remove(uri);
    }

    /// Number of GETs served for `uri` so far.
    pub fn get_count(&self, uri: &str) -> usize {
        let counts = self.get_counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(uri).copied().unwrap_or(0)
    }

    /// Total GETs served across all URIs.
    pub fn total_get_count(&self) -> usize {
        let counts = self.get_counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.values().sum()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RedfishTransport for MockTransport {
    fn root_uri(&self) -> &str {
        &self.root_uri
    }

    async fn get(&self, path: &str) -> TransportResult<Response> {
        {
            let mut counts = self.get_counts.lock().unwrap_or_else(|e| e.into_inner());
            *counts.entry(path.to_string()).or_insert(0) += 1;
        }
        let resources = self.resources.lock().unwrap_or_else(|e| e.into_inner());
        let (code, body) = match resources.get(path) {
            Some(body) => (200, body.clone()),
            None => (404, Value::Null),
        };
        Ok(Response {
            code,
            body,
            headers: HashMap::new(),
        })
    }

    async fn post(&self, _path: &str, _body: &Value) -> TransportResult<Response> {
        Err(TransportError::Unavailable("mock transport is read-only".to_string()))
    }

    async fn patch(&self, _path: &str, _body: &Value) -> TransportResult<Response> {
        Err(TransportError::Unavailable("mock transport is read-only".to_string()))
    }

    async fn delete(&self, _path: &str, _body: &Value) -> TransportResult<Response> {
        Err(TransportError::Unavailable("mock transport is read-only".to_string()))
    }
}
