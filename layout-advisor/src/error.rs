//! Errors raised while talking to the suggestion service.

use layout_core::UnavailableReason;
use thiserror::Error;

/// Errors that can occur when requesting a layout rewrite.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// No API credential was configured.
    #[error("no suggestion service credential configured")]
    MissingCredential,
    /// The service base URL provided by configuration is invalid.
    #[error("invalid suggestion service URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, TLS, body read, etc.).
    #[error("suggestion service HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The response body was not the expected JSON.
    #[error("failed to parse suggestion service payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The service rejected the credential.
    #[error("suggestion service rejected credential (HTTP {0})")]
    Unauthorized(u16),
    /// The service returned another non-success status.
    #[error("suggestion service returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
    /// The service answered without any usable text.
    #[error("suggestion service returned an empty response")]
    EmptyResponse,
}

impl From<AdvisorError> for UnavailableReason {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::MissingCredential => Self::MissingCredential,
            AdvisorError::InvalidUrl(url) => Self::Network(format!("invalid URL: {url}")),
            AdvisorError::Http(e) if e.is_decode() => Self::Malformed(e.to_string()),
            AdvisorError::Http(e) => Self::Network(e.to_string()),
            AdvisorError::Json(e) => Self::Malformed(e.to_string()),
            AdvisorError::Unauthorized(status) => Self::Unauthorized(status),
            AdvisorError::Status { status, .. } => Self::Status(status),
            AdvisorError::EmptyResponse => Self::EmptyResponse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_mapping() {
        assert_eq!(
            UnavailableReason::from(AdvisorError::MissingCredential),
            UnavailableReason::MissingCredential
        );
        assert_eq!(
            UnavailableReason::from(AdvisorError::Unauthorized(403)),
            UnavailableReason::Unauthorized(403)
        );
        assert_eq!(
            UnavailableReason::from(AdvisorError::Status {
                status: 500,
                body: "boom".into()
            }),
            UnavailableReason::Status(500)
        );

        let json_err = serde_json::from_str::<serde_json::Value>("{").expect_err("bad json");
        assert!(matches!(
            UnavailableReason::from(AdvisorError::Json(json_err)),
            UnavailableReason::Malformed(_)
        ));
    }
}
