//! View construction error types
//!
//! Error codes:
//! - AERO_VIEW_DATASET_NOT_FOUND (REJECT)
//! - AERO_VIEW_SAVED_VIEW_NOT_FOUND (REJECT)
//! - AERO_VIEW_NOT_GROUPED (REJECT)
//! - AERO_VIEW_INVALID_DATASET (REJECT)
//! - AERO_VIEW_CONFIG_ERROR (FATAL)
//! - AERO_VIEW_TASK_FAILED (ERROR)
//! - filter and stage codes are passed through unchanged

use thiserror::Error;

use crate::expr::ObjectIdError;
use crate::filters::FilterError;
use crate::stages::StageError;

/// Result type for view construction
pub type ViewResult<T> = Result<T, ViewError>;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Dataset '{name}' not found")]
    DatasetNotFound { name: String },

    #[error("Saved view '{view}' not found on dataset '{dataset}'")]
    SavedViewNotFound { dataset: String, view: String },

    /// Group filter sent for a dataset without a group field
    #[error("Dataset '{dataset}' is not a grouped dataset")]
    NotGrouped { dataset: String },

    #[error("Invalid dataset description: {reason}")]
    InvalidDataset { reason: String },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// The blocking task running an awaitable build panicked or was cancelled
    #[error("View build task failed: {reason}")]
    TaskFailed { reason: String },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Stage(#[from] StageError),
}

impl From<ObjectIdError> for ViewError {
    fn from(err: ObjectIdError) -> Self {
        ViewError::Stage(StageError::from(err))
    }
}

impl ViewError {
    pub fn config(reason: impl Into<String>) -> Self {
        ViewError::Config {
            reason: reason.into(),
        }
    }

    pub fn invalid_dataset(reason: impl Into<String>) -> Self {
        ViewError::InvalidDataset {
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ViewError::DatasetNotFound { .. } => "AERO_VIEW_DATASET_NOT_FOUND",
            ViewError::SavedViewNotFound { .. } => "AERO_VIEW_SAVED_VIEW_NOT_FOUND",
            ViewError::NotGrouped { .. } => "AERO_VIEW_NOT_GROUPED",
            ViewError::InvalidDataset { .. } => "AERO_VIEW_INVALID_DATASET",
            ViewError::Config { .. } => "AERO_VIEW_CONFIG_ERROR",
            ViewError::TaskFailed { .. } => "AERO_VIEW_TASK_FAILED",
            ViewError::Filter(err) => err.code(),
            ViewError::Stage(err) => err.code(),
        }
    }

    /// Whether the caller sent something malformed, as opposed to a local failure
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ViewError::Config { .. } | ViewError::TaskFailed { .. })
    }
}
