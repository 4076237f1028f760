//! CLI argument definitions using clap
//!
//! Commands:
//! - aeroview compile --dataset <path> [--request <path>] [--config <path>]
//! - aeroview start --dataset <path>... [--config <path>]
//! - aeroview check --dataset <path> [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AeroView - compiles filter requests into view stage pipelines
#[derive(Parser, Debug)]
#[command(name = "aeroview")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile one view request and exit
    Compile {
        /// Dataset description file
        #[arg(long)]
        dataset: PathBuf,

        /// Request file; read from stdin if omitted
        #[arg(long)]
        request: Option<PathBuf>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compile newline-delimited requests from stdin until EOF
    Start {
        /// Dataset description files
        #[arg(long, required = true)]
        dataset: Vec<PathBuf>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a dataset description and print its layout
    Check {
        /// Dataset description file
        #[arg(long)]
        dataset: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
