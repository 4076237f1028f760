//! CLI module for AeroView
//!
//! Provides command-line interface for:
//! - compile: Compile one view request
//! - start: Compile newline-delimited requests from stdin
//! - check: Validate a dataset description

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, compile, compiled_to_json, describe_dataset, run, run_command, start};
pub use errors::{CliError, CliResult};
pub use io::{read_request, write_error, write_response};
