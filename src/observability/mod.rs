//! Observability for filedb
//!
//! Logging is a capability handed to the driver at construction time. The
//! driver never reaches for a global logger.
//!
//! # Usage
//!
//! ```ignore
//! use filedb::observability::{ConsoleLogger, Logger, Severity};
//!
//! let logger = ConsoleLogger::new(Severity::Debug);
//! logger.info("SERVER_STARTED", &[("port", "8080")]);
//! ```

mod logger;

pub use logger::{ConsoleLogger, ConsoleTarget, LogRecord, Logger, MemoryLogger, NoopLogger, Severity};

use std::sync::Arc;

/// Shared logger handle as stored by the driver and the service layer
pub type SharedLogger = Arc<dyn Logger>;

/// Default logger substituted when the host supplies none
pub fn default_logger() -> SharedLogger {
    Arc::new(ConsoleLogger::default())
}
