//! Error types for sync sessions.

use thiserror::Error;

use layout_advisor::AdvisorError;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors from interacting with a sync session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session actor has stopped.
    #[error("sync session {0} is closed")]
    Closed(String),

    /// The suggestion service could not be built from configuration.
    #[error("suggestion service setup failed: {0}")]
    Advisor(#[from] AdvisorError),
}
