//! Fault injection for testing write atomicity
//!
//! Two mechanisms share the same point names:
//!
//! - Process crash: when the `FILEDB_CRASH_POINT` environment variable names a
//!   point, [`maybe_crash`] terminates the process via `std::process::abort()`.
//!   No cleanup, no unwinding, no catching.
//! - In-process fault: a [`FaultPoints`] set attached to a driver makes the
//!   driver fail with an injected I/O error at the named point.
//!
//! # Usage
//!
//! ```bash
//! FILEDB_CRASH_POINT=write_before_rename filedb write users alice < alice.json
//! ```

use std::collections::HashSet;
use std::io;
use std::sync::OnceLock;

/// Environment variable naming the crash point to trigger
pub const CRASH_POINT_ENV: &str = "FILEDB_CRASH_POINT";

/// Cache the crash point name to avoid repeated env var lookups
static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Check if a specific crash point is enabled
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Trigger a crash if the named crash point is enabled.
///
/// This is a no-op when `FILEDB_CRASH_POINT` is not set or doesn't match.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined point names
pub mod points {
    pub const WRITE_BEFORE_TEMP: &str = "write_before_temp";
    pub const WRITE_BEFORE_RENAME: &str = "write_before_rename";
    pub const WRITE_AFTER_RENAME: &str = "write_after_rename";
    pub const DELETE_BEFORE_REMOVE: &str = "delete_before_remove";

    /// Get all point names
    pub fn all() -> &'static [&'static str] {
        &[
            WRITE_BEFORE_TEMP,
            WRITE_BEFORE_RENAME,
            WRITE_AFTER_RENAME,
            DELETE_BEFORE_REMOVE,
        ]
    }
}

/// Set of points at which a driver fails with an injected I/O error.
///
/// Empty by default, in which case [`FaultPoints::check`] always succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPoints {
    enabled: HashSet<String>,
}

impl FaultPoints {
    /// No faults
    pub fn none() -> Self {
        Self::default()
    }

    /// Fail at a single point
    pub fn at(name: &str) -> Self {
        Self::none().with(name)
    }

    /// Add a point to the set
    pub fn with(mut self, name: &str) -> Self {
        self.enabled.insert(name.to_string());
        self
    }

    /// Whether the named point is enabled
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    /// Pass through a point: crash if the env var names it, fail if this set
    /// names it, succeed otherwise.
    pub fn check(&self, name: &str) -> io::Result<()> {
        maybe_crash(name);
        if self.is_enabled(name) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected fault at {}", name),
            ));
        }
        Ok(())
    }
}
