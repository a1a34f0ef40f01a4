//! Path resolution with stored-suffix fallback
//!
//! Callers address resources by their logical identifier. On disk a resource
//! lives at `<resource>.json`, so resolution tries the exact path first and
//! then the same path with the stored suffix appended.

use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

/// Suffix of stored documents
pub const STORED_SUFFIX: &str = "json";

/// Suffix appended to the final path while a write is in flight
pub const TEMP_SUFFIX: &str = "tmp";

/// A path that exists on disk, with the metadata observed while resolving it
#[derive(Debug, Clone)]
pub struct Resolved {
    pub path: PathBuf,
    pub metadata: Metadata,
}

impl Resolved {
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }
}

/// Append `.suffix` to the final component of `path`
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Resolve `path`, falling back to `path.json`.
///
/// Returns `Ok(None)` when neither exists. Errors other than "not found" on
/// the exact path are returned as-is, without trying the fallback.
pub fn resolve(path: &Path) -> io::Result<Option<Resolved>> {
    match fs::metadata(path) {
        Ok(metadata) => {
            return Ok(Some(Resolved {
                path: path.to_path_buf(),
                metadata,
            }))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let suffixed = with_suffix(path, STORED_SUFFIX);
    match fs::metadata(&suffixed) {
        Ok(metadata) => Ok(Some(Resolved {
            path: suffixed,
            metadata,
        })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
