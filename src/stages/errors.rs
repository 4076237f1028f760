//! Stage error types
//!
//! Error codes:
//! - AERO_STAGE_INVALID (REJECT)
//! - AERO_STAGE_INVALID_ID (REJECT)

use thiserror::Error;

use crate::expr::ObjectIdError;

/// Result type for stage construction
pub type StageResult<T> = Result<T, StageError>;

#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// Serialized stage could not be decoded
    #[error("Invalid stage '{name}': {reason}")]
    Invalid { name: String, reason: String },

    /// Stage argument carried a malformed id
    #[error("{0}")]
    InvalidId(#[from] ObjectIdError),
}

impl StageError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StageError::Invalid { .. } => "AERO_STAGE_INVALID",
            StageError::InvalidId(_) => "AERO_STAGE_INVALID_ID",
        }
    }
}
