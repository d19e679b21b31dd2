//! HTTP transport backed by reqwest.

use super::{RedfishTransport, Response, TransportError, TransportResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Endpoint configuration for an HTTP-reachable Redfish service.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Scheme, host and port, e.g. `https://10.0.0.1:443`.
    pub base_url: String,
    /// Service root path.
    pub root_uri: String,
    pub timeout: Duration,
    /// Bearer token sent with every request when set.
    pub auth_token: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            root_uri: "/redfish/v1".to_string(),
            timeout: Duration::from_secs(30),
            auth_token: None,
        }
    }
}

pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> TransportResult<Response> {
        let builder = match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let code = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| TransportError::InvalidJson(e.to_string()))?
        };

        Ok(Response {
            code,
            body,
            headers,
        })
    }
}

#[async_trait]
impl RedfishTransport for HttpTransport {
    fn root_uri(&self) -> &str {
        &self.config.root_uri
    }

    async fn get(&self, path: &str) -> TransportResult<Response> {
        self.execute(self.client.get(self.url_for(path))).await
    }

    async fn post(&self, path: &str, body: &Value) -> TransportResult<Response> {
        self.execute(self.client.post(self.url_for(path)).json(body))
            .await
    }

    async fn patch(&self, path: &str, body: &Value) -> TransportResult<Response> {
        self.execute(self.client.patch(self.url_for(path)).json(body))
            .await
    }

    async fn delete(&self, path: &str, body: &Value) -> TransportResult<Response> {
        self.execute(self.client.delete(self.url_for(path)).json(body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.root_uri, "/redfish/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_url_join_trims_trailing_slash() {
        let transport = HttpTransport::new(HttpTransportConfig {
            base_url: "http://bmc:8000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            transport.url_for("/redfish/v1/Chassis"),
            "http://bmc:8000/redfish/v1/Chassis"
        );
    }

    #[test]
    fn test_root_uri_comes_from_config() {
        let transport = HttpTransport::new(HttpTransportConfig::default()).unwrap();
        assert_eq!(transport.root_uri(), "/redfish/v1");
    }
}
