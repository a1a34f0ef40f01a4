//! filedb CLI entry point
//!
//! Parses arguments, dispatches to the CLI module, reports failures as a
//! JSON error envelope on stdout plus a line on stderr, and exits non-zero.

use filedb::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(e.code_str(), e.message());
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
