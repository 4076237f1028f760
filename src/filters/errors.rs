//! Filter compiler error types
//!
//! Error codes:
//! - AERO_VIEW_UNKNOWN_FIELD (REJECT)
//! - AERO_VIEW_UNSUPPORTED_FILTER (REJECT)
//! - AERO_VIEW_UNSUPPORTED_KEYPOINT_ATTRIBUTE (REJECT)
//! - AERO_VIEW_MISSING_SKELETON (REJECT)
//! - AERO_VIEW_INVALID_TIMESTAMP (REJECT)
//! - AERO_VIEW_INVALID_ID (REJECT)
//!
//! Unsupported combinations always fail. Dropping a filter silently would
//! return more data than the client asked for.

use thiserror::Error;

use crate::expr::ObjectIdError;

/// Result type for filter compilation
pub type FilterResult<T> = Result<T, FilterError>;

#[derive(Debug, Clone, Error)]
pub enum FilterError {
    /// Filtered path is not in the schema
    #[error("Unknown field '{path}'")]
    UnknownField { path: String },

    /// Field kind and filter keys do not fit together
    #[error("Unsupported filter on '{path}' ({kind}): {reason}")]
    UnsupportedFilter {
        path: String,
        kind: &'static str,
        reason: String,
    },

    /// Keypoint parallel attribute of a kind that cannot be filtered per point
    #[error("Unsupported keypoint list field '{path}' of type {kind}")]
    UnsupportedKeypointAttribute { path: String, kind: &'static str },

    /// `.points` filter on a field with no skeleton and no default
    #[error("No skeleton found for keypoint field '{path}'")]
    MissingSkeleton { path: String },

    /// Date bound outside the representable range
    #[error("Invalid timestamp {value} for '{path}'")]
    InvalidTimestamp { path: String, value: f64 },

    #[error("{0}")]
    InvalidId(#[from] ObjectIdError),
}

impl FilterError {
    pub fn unknown_field(path: impl Into<String>) -> Self {
        Self::UnknownField { path: path.into() }
    }

    pub fn unsupported(path: impl Into<String>, kind: &'static str, reason: impl Into<String>) -> Self {
        Self::UnsupportedFilter {
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            FilterError::UnknownField { .. } => "AERO_VIEW_UNKNOWN_FIELD",
            FilterError::UnsupportedFilter { .. } => "AERO_VIEW_UNSUPPORTED_FILTER",
            FilterError::UnsupportedKeypointAttribute { .. } => {
                "AERO_VIEW_UNSUPPORTED_KEYPOINT_ATTRIBUTE"
            }
            FilterError::MissingSkeleton { .. } => "AERO_VIEW_MISSING_SKELETON",
            FilterError::InvalidTimestamp { .. } => "AERO_VIEW_INVALID_TIMESTAMP",
            FilterError::InvalidId(_) => "AERO_VIEW_INVALID_ID",
        }
    }

    /// Path the error is about, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            FilterError::UnknownField { path }
            | FilterError::UnsupportedFilter { path, .. }
            | FilterError::UnsupportedKeypointAttribute { path, .. }
            | FilterError::MissingSkeleton { path }
            | FilterError::InvalidTimestamp { path, .. } => Some(path),
            FilterError::InvalidId(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_name_the_field() {
        let err = FilterError::UnsupportedKeypointAttribute {
            path: "kp.keypoints.visible".into(),
            kind: "string",
        };
        assert_eq!(err.code(), "AERO_VIEW_UNSUPPORTED_KEYPOINT_ATTRIBUTE");
        assert_eq!(err.path(), Some("kp.keypoints.visible"));
        assert!(err.to_string().contains("kp.keypoints.visible"));
    }

    #[test]
    fn test_id_errors_convert() {
        let err: FilterError = crate::expr::ObjectId::parse("x").unwrap_err().into();
        assert_eq!(err.code(), "AERO_VIEW_INVALID_ID");
        assert!(err.path().is_none());
    }
}
