//! Unified error handling for smctl-core
//!
//! Transport and parse failures bubble up unchanged; a 409 on a registration
//! action is not represented here at all because it is an ordinary `false`
//! result.
//!
//! # Example
//!
//! ```rust
//! use smctl_core::{CoreError, Result};
//!
//! fn handle_error(err: CoreError) {
//!     if err.is_not_found() {
//!         println!("Subscription not found");
//!     } else if err.is_retryable() {
//!         println!("Temporary error, can retry");
//!     }
//! }
//!
//! let err = CoreError::Transport { status: 404, body: String::new() };
//! assert!(err.is_not_found());
//! ```

use crate::config::ConfigError;
use crate::operation::OperationStatus;
use thiserror::Error;

/// Core error type for every smctl operation
#[derive(Error, Debug)]
pub enum CoreError {
    /// The endpoint answered with a non-success status
    #[error("HTTP {status}: {}", summarize(.body))]
    Transport { status: u16, body: String },

    /// The request never produced a response
    #[error("Connection error: {0}")]
    Connection(String),

    /// Response body was not the expected XML document
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A provider reported a registration state we don't know
    #[error("Unknown registration state '{0}'")]
    UnknownState(String),

    /// Polling ran out of attempts while the operation was still in progress
    #[error(
        "Operation {tracking_id} still {} after {attempts} attempts",
        .last_status.status
    )]
    OperationTimeout {
        tracking_id: String,
        attempts: u32,
        last_status: Box<OperationStatus>,
    },

    /// The caller stopped waiting
    #[error("Wait for operation {0} was cancelled")]
    Cancelled(String),

    /// Input rejected before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Trim a response body so error messages stay on one screen
fn summarize(body: &str) -> String {
    const MAX: usize = 200;
    let body = body.trim();
    if body.is_empty() {
        return "(empty body)".to_string();
    }
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}... [{} bytes total]", &body[..idx], body.len()),
        None => body.to_string(),
    }
}

impl CoreError {
    /// HTTP status, if this error came from a response
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }

    /// Returns true if this is a conflict error (409)
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::OperationTimeout { .. })
    }

    /// Returns true if this is a bad request error (400)
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        match self {
            CoreError::Validation(_) => true,
            _ => self.status() == Some(400),
        }
    }

    /// Returns true if this error is potentially retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Connection(_) => true,
            CoreError::OperationTimeout { .. } => true,
            CoreError::Transport { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{OperationState, OperationStatus};

    fn transport(status: u16) -> CoreError {
        CoreError::Transport {
            status,
            body: "<Error/>".to_string(),
        }
    }

    #[test]
    fn test_status_helpers() {
        assert!(transport(404).is_not_found());
        assert!(transport(401).is_unauthorized());
        assert!(transport(403).is_unauthorized());
        assert!(transport(503).is_server_error());
        assert!(transport(409).is_conflict());
        assert!(transport(400).is_bad_request());
        assert!(!transport(400).is_retryable());
        assert!(transport(429).is_retryable());
        assert!(transport(500).is_retryable());
    }

    #[test]
    fn test_timeout_error() {
        let err = CoreError::OperationTimeout {
            tracking_id: "abc".to_string(),
            attempts: 30,
            last_status: Box::new(OperationStatus::new("abc", OperationState::InProgress)),
        };
        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert!(err.status().is_none());
        let msg = err.to_string();
        assert!(msg.contains("InProgress"), "{msg}");
        assert!(msg.contains("30 attempts"), "{msg}");
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = CoreError::Validation("empty resource type".to_string());
        assert!(err.is_bad_request());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transport_display_truncates_body() {
        let err = CoreError::Transport {
            status: 500,
            body: "x".repeat(1000),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("HTTP 500: "));
        assert!(msg.contains("[1000 bytes total]"));

        let empty = CoreError::Transport {
            status: 502,
            body: "  ".to_string(),
        };
        assert_eq!(empty.to_string(), "HTTP 502: (empty body)");
    }
}
