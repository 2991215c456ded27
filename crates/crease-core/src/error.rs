//! Error types for CREASE sessions

use thiserror::Error;

/// Why the intake refused a submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("unsupported type")]
    UnsupportedType { name: String, media_type: String },

    #[error("file too large: {size} bytes exceeds {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("no file selected")]
    NoFile,
}

/// Core CREASE errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreaseError {
    // Intake errors
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    // Media errors
    #[error("Playback URL unavailable: {0}")]
    MediaUnavailable(String),

    // Workflow errors
    #[error("Cannot {intent} while {stage}")]
    InvalidTransition {
        intent: &'static str,
        stage: &'static str,
    },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Runtime errors
    #[error("Session runtime closed")]
    RuntimeClosed,
}

impl CreaseError {
    /// Whether the error is reported inline and leaves the session usable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CreaseError::Rejected(_)
                | CreaseError::MediaUnavailable(_)
                | CreaseError::InvalidTransition { .. }
        )
    }
}

/// Result type for CREASE operations
pub type CreaseResult<T> = Result<T, CreaseError>;
