//! CLI command implementations
//!
//! One-shot commands open the driver, run a single operation, print one
//! JSON envelope on stdout, and exit. Their logs go to stderr.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::driver::{Driver, DriverOptions};
use crate::http_server::config::{default_host, default_port};
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::{ConsoleLogger, Severity, SharedLogger};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_document, write_response};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory of the store (default "./data")
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// HTTP bind host (default "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port (default 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Remove orphaned temp files when `serve` starts (default true)
    #[serde(default = "default_sweep_on_open")]
    pub sweep_on_open: bool,

    /// CORS allowed origins; empty allows any
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_sweep_on_open() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            sweep_on_open: default_sweep_on_open(),
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.port == 0 {
            return Err(CliError::config_error("port must be > 0"));
        }

        self.severity()?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Parsed minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(CliError::config_error)
    }

    /// HTTP settings for `serve`
    pub fn http_config(&self) -> HttpServerConfig {
        HttpServerConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
        }
    }
}

/// Run the CLI with arguments from the environment
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Write {
            config,
            collection,
            resource,
        } => write(&config, &collection, &resource),
        Command::Read {
            config,
            collection,
            resource,
        } => read(&config, &collection, &resource),
        Command::ReadAll { config, collection } => read_all(&config, &collection),
        Command::Delete {
            config,
            collection,
            resource,
        } => delete(&config, &collection, &resource),
        Command::Sweep { config } => sweep(&config),
    }
}

/// Open the store and serve the HTTP API until the listener fails
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let logger: SharedLogger = Arc::new(ConsoleLogger::new(config.severity()?));

    let driver = Driver::open(
        config.data_path(),
        DriverOptions::new()
            .with_logger(Arc::clone(&logger))
            .with_sweep_on_open(config.sweep_on_open),
    )
    .map_err(|e| CliError::boot_failed(format!("Failed to open data directory: {}", e)))?;

    let mut http_config = config.http_config();
    if let Some(port) = port {
        http_config.port = port;
    }
    let server = HttpServer::new(http_config, Arc::new(driver), Arc::clone(&logger));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Store the JSON document on stdin
pub fn write(config_path: &Path, collection: &str, resource: &str) -> CliResult<()> {
    let driver = open_one_shot(config_path)?;
    let document = read_document(&mut io::stdin().lock())?;

    driver.write(collection, resource, &document)?;

    write_response(json!({
        "collection": collection,
        "resource": resource,
    }))
}

/// Print one stored document
pub fn read(config_path: &Path, collection: &str, resource: &str) -> CliResult<()> {
    let driver = open_one_shot(config_path)?;
    let document: Value = driver.read_as(collection, resource)?;
    write_response(document)
}

/// Print all documents of a collection
pub fn read_all(config_path: &Path, collection: &str) -> CliResult<()> {
    let driver = open_one_shot(config_path)?;
    let documents: Vec<Value> = driver.read_all_as(collection)?;
    write_response(Value::Array(documents))
}

/// Delete one stored document
pub fn delete(config_path: &Path, collection: &str, resource: &str) -> CliResult<()> {
    let driver = open_one_shot(config_path)?;
    driver.delete(collection, resource)?;
    write_response(json!({
        "collection": collection,
        "resource": resource,
    }))
}

/// Remove orphaned temp files
pub fn sweep(config_path: &Path) -> CliResult<()> {
    let driver = open_one_shot(config_path)?;
    let removed = driver.sweep_temp_files()?;
    write_response(json!({ "removed": removed }))
}

/// Open the driver for a one-shot command.
///
/// Never sweeps: another process may be mid-write in the same root.
fn open_one_shot(config_path: &Path) -> CliResult<Driver> {
    let config = Config::load(config_path)?;
    let logger: SharedLogger = Arc::new(ConsoleLogger::stderr(config.severity()?));

    Driver::open(config.data_path(), DriverOptions::new().with_logger(logger))
        .map_err(|e| CliError::boot_failed(format!("Failed to open data directory: {}", e)))
}
