//! CLI error type
//!
//! Compilation failures keep the code of the underlying view error, so a
//! client sees the same code from the CLI as from an in-process call.

use std::io;

use thiserror::Error;

use crate::view::ViewError;

#[derive(Debug, Error)]
pub enum CliError {
    /// Config file unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// stdin/stdout or an input file failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Request body is not a valid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// View construction failed
    #[error(transparent)]
    View(ViewError),
}

impl CliError {
    /// Stable code for the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "AERO_CLI_CONFIG_ERROR",
            CliError::Io(_) => "AERO_CLI_IO_ERROR",
            CliError::InvalidRequest(_) => "AERO_CLI_INVALID_REQUEST",
            CliError::View(err) => err.code(),
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::InvalidRequest(e.to_string())
    }
}

impl From<ViewError> for CliError {
    fn from(e: ViewError) -> Self {
        match e {
            ViewError::Config { reason } => CliError::Config(reason),
            other => CliError::View(other),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
