//! Application error types.

use thiserror::Error;

/// Application-level errors for Graphex.
#[derive(Error, Debug)]
pub enum AppError {
    // Gateway errors
    #[error("query transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("query failed: {message}")]
    Query { message: String, query: String },

    // Normalization errors
    #[error("response normalization failed: {0}")]
    Normalization(String),

    // Controller lifecycle errors
    #[error("controller is already bound to a rendering surface")]
    AlreadyBound,

    #[error("controller is not bound to a rendering surface")]
    NotBound,

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("no enabled command for direction: {0}")]
    CommandUnavailable(String),

    // Config errors
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
