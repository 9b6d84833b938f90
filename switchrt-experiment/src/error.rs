//! Error types for the experiment engine and its collaborators.

use std::path::PathBuf;

use switchrt_core::TaskPhase;
use thiserror::Error;

use crate::store::SessionId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not a valid email address: {0:?}")]
    InvalidEmail(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted document could not be decoded.
    #[error("corrupt store {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode results: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`crate::ExperimentStateMachine`]. None of them leave the
/// engine in an inconsistent state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No authenticated participant; the host should send them to login.
    #[error("authentication required")]
    AuthRequired,

    #[error("nothing to submit while in {phase}")]
    NotReadyToSubmit { phase: TaskPhase },

    #[error("results already submitted as session {0}")]
    AlreadySubmitted(SessionId),

    /// The store rejected the results. Recorded trials are kept for a retry.
    #[error("submission failed: {0}")]
    SubmissionFailed(#[source] StoreError),
}

impl EngineError {
    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::SubmissionFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_submission_failures_are_retryable() {
        let failed = EngineError::SubmissionFailed(StoreError::Unavailable("offline".into()));
        assert!(failed.is_retryable());
        assert!(!EngineError::AuthRequired.is_retryable());
        assert!(!EngineError::AlreadySubmitted(4).is_retryable());
    }

    #[test]
    fn messages_name_the_cause() {
        let err = EngineError::NotReadyToSubmit {
            phase: TaskPhase::Playing,
        };
        assert_eq!(err.to_string(), "nothing to submit while in playing");
        let err = EngineError::SubmissionFailed(StoreError::Unavailable("offline".into()));
        assert_eq!(err.to_string(), "submission failed: store unavailable: offline");
    }
}
