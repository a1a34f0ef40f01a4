//! Structured logging capability
//!
//! The storage driver only depends on the [`Logger`] trait. Hosting code picks
//! an implementation:
//! - [`ConsoleLogger`]: JSON lines on stdout/stderr
//! - [`NoopLogger`]: discards everything
//! - [`MemoryLogger`]: keeps events in memory for assertions
//!
//! Console output format:
//! - One log line = one event
//! - `event` first, then `severity`, then fields sorted by key
//! - Synchronous, no buffering

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Very fine grained detail
    Trace = 0,
    /// Diagnostic detail
    Debug = 1,
    /// Normal operations
    Info = 2,
    /// Recoverable issues
    Warn = 3,
    /// Operation failures
    Error = 4,
    /// Unrecoverable, process exits
    Fatal = 5,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(format!("unknown log level: '{}'", other)),
        }
    }
}

/// Severity-leveled logging capability.
///
/// Implementors only provide [`Logger::log`]; the per-level helpers forward to it.
pub trait Logger: Send + Sync {
    /// Record one event with the given severity and fields
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]);

    /// Log at FATAL level
    fn fatal(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Fatal, event, fields);
    }

    /// Log at ERROR level
    fn error(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Error, event, fields);
    }

    /// Log at WARN level
    fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event, fields);
    }

    /// Log at INFO level
    fn info(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Info, event, fields);
    }

    /// Log at DEBUG level
    fn debug(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Debug, event, fields);
    }

    /// Log at TRACE level
    fn trace(&self, event: &str, fields: &[(&str, &str)]) {
        self.log(Severity::Trace, event, fields);
    }
}

/// Where console output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    /// ERROR and FATAL to stderr, the rest to stdout
    Split,
    /// Everything to stderr, keeping stdout free for command output
    Stderr,
}

/// A structured logger that writes JSON lines to the console.
///
/// Events below `min_severity` are dropped.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleLogger {
    min_severity: Severity,
    target: ConsoleTarget,
}

impl ConsoleLogger {
    /// Create a console logger that keeps events at or above `min_severity`
    pub fn new(min_severity: Severity) -> Self {
        Self {
            min_severity,
            target: ConsoleTarget::Split,
        }
    }

    /// Console logger that writes every event to stderr
    pub fn stderr(min_severity: Severity) -> Self {
        Self {
            min_severity,
            target: ConsoleTarget::Stderr,
        }
    }

    /// The lowest severity this logger emits
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    /// Render one event as a single JSON line (newline included)
    pub fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(256);

        output.push('{');

        output.push_str("\"event\":\"");
        escape_json_string(&mut output, event);
        output.push('"');

        output.push_str(",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            escape_json_string(&mut output, key);
            output.push_str("\":\"");
            escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output.push('\n');
        output
    }

    fn write_line<W: Write>(writer: &mut W, line: &str) {
        // Logging must never fail the caller
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity < self.min_severity {
            return;
        }
        let line = Self::format_line(severity, event, fields);
        if severity >= Severity::Error || self.target == ConsoleTarget::Stderr {
            Self::write_line(&mut io::stderr(), &line);
        } else {
            Self::write_line(&mut io::stdout(), &line);
        }
    }
}

/// Logger that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _severity: Severity, _event: &str, _fields: &[(&str, &str)]) {}
}

/// One event captured by [`MemoryLogger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    pub event: String,
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    /// Look up a field value by key
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory logger, cloneable so a test can keep a handle while the
/// driver owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogger {
    /// Create an empty in-memory logger
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured records, oldest first
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured records with the given event name
    pub fn events_named(&self, event: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.event == event)
            .collect()
    }

    /// Number of captured records
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Logger for MemoryLogger {
    fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let record = LogRecord {
            severity,
            event: event.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

fn escape_json_string(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => {
                output.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Debug);
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("debug".parse::<Severity>().unwrap(), Severity::Debug);
        assert_eq!("INFO".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warn);
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn test_log_json_format() {
        let output = ConsoleLogger::format_line(Severity::Debug, "TEST_EVENT", &[]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "TEST_EVENT");
        assert_eq!(parsed["severity"], "DEBUG");
    }

    #[test]
    fn test_log_deterministic_ordering() {
        let output1 = ConsoleLogger::format_line(
            Severity::Info,
            "TEST",
            &[("zebra", "1"), ("apple", "2"), ("mango", "3")],
        );
        let output2 = ConsoleLogger::format_line(
            Severity::Info,
            "TEST",
            &[("apple", "2"), ("mango", "3"), ("zebra", "1")],
        );
        assert_eq!(output1, output2);

        let apple_pos = output1.find("apple").unwrap();
        let zebra_pos = output1.find("zebra").unwrap();
        assert!(apple_pos < zebra_pos);
    }

    #[test]
    fn test_log_escapes_special_chars() {
        let output = ConsoleLogger::format_line(
            Severity::Info,
            "TEST",
            &[("root", "C:\\data \"main\"\nnext")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["root"], "C:\\data \"main\"\nnext");
        assert_eq!(output.chars().filter(|c| *c == '\n').count(), 1);
    }

    #[test]
    fn test_memory_logger_captures_levels() {
        let logger = MemoryLogger::new();
        logger.debug("A", &[("k", "v")]);
        logger.fatal("B", &[]);

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].severity, Severity::Debug);
        assert_eq!(records[0].field("k"), Some("v"));
        assert_eq!(records[1].severity, Severity::Fatal);
        assert_eq!(logger.events_named("B").len(), 1);
    }

    #[test]
    fn test_noop_logger_is_silent() {
        let logger = NoopLogger;
        logger.error("IGNORED", &[]);
    }
}
