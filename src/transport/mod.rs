//! Raw REST verbs over an abstract channel.
//!
//! A [`RedfishTransport`] moves bytes to and from one Redfish service and
//! parses response bodies as JSON. Application-level success or failure is
//! carried in [`Response::code`]; a [`TransportError`] means the request
//! never completed.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

pub mod http;
pub mod mock;

pub use http::{HttpTransport, HttpTransportConfig};
pub use mock::MockTransport;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection or protocol failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request deadline elapsed.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The response body could not be parsed as JSON.
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),

    /// The transport cannot serve requests at all.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// A completed REST exchange.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub code: u16,
    /// Parsed JSON body; `Value::Null` when the body was empty.
    pub body: Value,
    /// Response headers.
    pub headers: HashMap<String, String>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Data-layer-protocol agnostic interface for RESTful operations against a
/// Redfish service.
#[async_trait]
pub trait RedfishTransport: Send + Sync {
    /// URI of the service root, e.g. `/redfish/v1`.
    fn root_uri(&self) -> &str;

    async fn get(&self, path: &str) -> TransportResult<Response>;
    async fn post(&self, path: &str, body: &Value) -> TransportResult<Response>;
    async fn patch(&self, path: &str, body: &Value) -> TransportResult<Response>;
    async fn delete(&self, path: &str, body: &Value) -> TransportResult<Response>;
}

/// A placeholder transport that gracefully fails every operation.
#[derive(Debug, Default)]
pub struct NullTransport;

#[async_trait]
impl RedfishTransport for NullTransport {
    fn root_uri(&self) -> &str {
        ""
    }

    async fn get(&self, _path: &str) -> TransportResult<Response> {
        Err(TransportError::Unavailable("null transport".to_string()))
    }

    async fn post(&self, _path: &str, _body: &Value) -> TransportResult<Response> {
        Err(TransportError::Unavailable("null transport".to_string()))
    }

    async fn patch(&self, _path: &str, _body: &Value) -> TransportResult<Response> {
        Err(TransportError::Unavailable("null transport".to_string()))
    }

    async fn delete(&self, _path: &str, _body: &Value) -> TransportResult<Response> {
        Err(TransportError::Unavailable("null transport".to_string()))
    }
}
