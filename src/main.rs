//! `aeroview` binary
//!
//! Argument parsing and every command live in `aeroview::cli`. A failed
//! command is reported as an error envelope on stdout and exit status 1.

use aeroview::cli;

fn main() {
    if let Err(e) = cli::run() {
        if cli::write_error(e.code(), &e.message()).is_err() {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
