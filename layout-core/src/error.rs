//! Error types for layout operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for source patching.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors from the text patch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatchError {
    /// No inline style declaration was found to rewrite.
    ///
    /// Non-fatal: the caller keeps the source unchanged.
    #[error("no inline style declaration found; source left unchanged")]
    NotApplied,
}

/// Why a layout suggestion could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// No service credential is configured.
    #[error("no suggestion service credential configured")]
    MissingCredential,

    /// The service could not be reached.
    #[error("suggestion service unreachable: {0}")]
    Network(String),

    /// The service rejected the credential.
    #[error("suggestion service rejected credential (HTTP {0})")]
    Unauthorized(u16),

    /// The service answered with a non-success status.
    #[error("suggestion service returned HTTP {0}")]
    Status(u16),

    /// The response payload could not be understood.
    #[error("malformed suggestion response: {0}")]
    Malformed(String),

    /// The service answered with no usable text.
    #[error("suggestion service returned an empty response")]
    EmptyResponse,

    /// The request did not complete within the configured timeout.
    #[error("suggestion request timed out after {0}ms")]
    Timeout(u64),
}

/// Failure reported by the external render pipeline.
///
/// Surfaced to the user; never rolls back committed source by itself.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("render failed: {message}")]
pub struct RenderError {
    /// Human readable message (syntax error, runtime error, ...).
    pub message: String,
}

impl RenderError {
    /// Create a render error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_reason_display() {
        assert_eq!(
            UnavailableReason::Unauthorized(401).to_string(),
            "suggestion service rejected credential (HTTP 401)"
        );
        assert_eq!(
            UnavailableReason::Timeout(20_000).to_string(),
            "suggestion request timed out after 20000ms"
        );
    }

    #[test]
    fn test_unavailable_reason_serialization() {
        let json = serde_json::to_string(&UnavailableReason::Status(502)).expect("serialize");
        assert_eq!(json, r#"{"kind":"status","detail":502}"#);

        let json = serde_json::to_string(&UnavailableReason::EmptyResponse).expect("serialize");
        assert_eq!(json, r#"{"kind":"empty_response"}"#);
    }

    #[test]
    fn test_render_error_message() {
        let err = RenderError::new("Unexpected token '<'");
        assert_eq!(err.to_string(), "render failed: Unexpected token '<'");
    }
}
