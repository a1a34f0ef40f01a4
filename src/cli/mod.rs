//! CLI module for filedb
//!
//! Provides command-line interface for:
//! - serve: open the data directory and run the HTTP service
//! - write/read/read-all/delete: one-shot driver operations
//! - sweep: remove orphaned temp files

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{delete, read, read_all, run, run_command, serve, sweep, write, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_document, write_error, write_response};
