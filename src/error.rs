//! Error types for the Flow connection library.

use thiserror::Error;

/// Base error type for Flow operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Toolkit error: {0}")]
    Toolkit(#[from] ToolkitError),

    #[error("{0}")]
    Other(String),
}

/// Raised when authentication fails (e.g. cancelled login or rejected
/// script credentials).
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
}

/// Raised by a toolkit call (template lookup, path enumeration, project
/// resolution). Carried through to callers unmodified.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ToolkitError {
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ToolkitError {
    pub fn new(message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            message: message.into(),
            details,
        }
    }
}
