//! HTTP implementation of the query gateway.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::AppError;
use crate::gateway::QueryGateway;

/// Gateway that POSTs queries to a gremlin-style HTTP endpoint.
///
/// Every request carries the extra headers from [`GatewayConfig`]. The
/// query travels as `{"gremlin": "<query>"}`; the response body is
/// delivered verbatim as JSON for the normalizer to interpret.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGateway {
    /// Builds a gateway from configuration.
    ///
    /// Fails if a configured header name or value is not valid HTTP.
    pub fn new(config: &GatewayConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name: HeaderName = name.parse().map_err(|_| AppError::Query {
                message: format!("invalid header name: {name}"),
                query: String::new(),
            })?;
            let value: HeaderValue = value.parse().map_err(|_| AppError::Query {
                message: format!("invalid value for header: {name}"),
                query: String::new(),
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl QueryGateway for HttpGateway {
    async fn send(&self, query: &str) -> Result<Value, AppError> {
        tracing::debug!(endpoint = %self.endpoint, "sending query");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "gremlin": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Query {
                message: format!("service returned {status}: {body}"),
                query: query.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}
