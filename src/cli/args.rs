//! CLI argument definitions using clap
//!
//! Commands:
//! - filedb serve --config <path> [--port <port>]
//! - filedb write --config <path> <collection> <resource>   (document on stdin)
//! - filedb read --config <path> <collection> <resource>
//! - filedb read-all --config <path> <collection>
//! - filedb delete --config <path> <collection> <resource>
//! - filedb sweep --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// filedb - documents stored as files, one directory per collection
#[derive(Parser, Debug)]
#[command(name = "filedb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the data directory and serve the users HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./filedb.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Store one JSON document read from stdin
    Write {
        /// Path to configuration file
        #[arg(long, default_value = "./filedb.json")]
        config: PathBuf,
        collection: String,
        resource: String,
    },

    /// Print one stored document
    Read {
        /// Path to configuration file
        #[arg(long, default_value = "./filedb.json")]
        config: PathBuf,
        collection: String,
        resource: String,
    },

    /// Print every document in a collection
    ReadAll {
        /// Path to configuration file
        #[arg(long, default_value = "./filedb.json")]
        config: PathBuf,
        collection: String,
    },

    /// Delete one stored document
    Delete {
        /// Path to configuration file
        #[arg(long, default_value = "./filedb.json")]
        config: PathBuf,
        collection: String,
        resource: String,
    },

    /// Remove temp files left behind by interrupted writes
    Sweep {
        /// Path to configuration file
        #[arg(long, default_value = "./filedb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
