//! Edge descriptor and edges-index error types.

use thiserror::Error;

/// Errors raised while validating descriptors or reading/writing `edges.v1`.
#[derive(Error, Debug)]
pub enum EdgeError {
    #[error("Unexpected schema: expected {expected}, found {found:?}")]
    Schema { expected: &'static str, found: String },

    #[error("Edge {label} invalid [{code}]: {message}")]
    Validation {
        label: String,
        code: &'static str,
        message: String,
    },

    #[error("Edge not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EdgeResult<T> = std::result::Result<T, EdgeError>;
