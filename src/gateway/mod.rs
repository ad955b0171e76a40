//! Query gateway: the transport seam to the remote graph-query service.
//!
//! The controller treats queries as opaque strings and results as opaque
//! JSON; the gateway owns the wire protocol. No retry policy is imposed
//! here — a failed send surfaces exactly once to the caller.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

/// Sends a query string to the remote graph-query service.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Executes one query and delivers the raw result.
    ///
    /// # Arguments
    ///
    /// * `query` - The query string, opaque to the controller
    async fn send(&self, query: &str) -> Result<Value, AppError>;
}
