//! Orphaned temporary file cleanup
//!
//! A write that fails or crashes between creating `<resource>.json.tmp` and
//! renaming it leaves the temp file behind. The final file is never affected,
//! so removing these is always safe once no write is in flight for the
//! collection.

use std::fs;
use std::io;
use std::path::Path;

use super::resolver::{STORED_SUFFIX, TEMP_SUFFIX};
use crate::observability::Logger;

/// Whether a file name is a write buffer of a stored document
pub fn is_temp_file(name: &str) -> bool {
    let temp_ending = format!(".{}.{}", STORED_SUFFIX, TEMP_SUFFIX);
    name.len() > temp_ending.len() && name.ends_with(&temp_ending)
}

/// Remove every temp file directly inside `dir`, returning how many went.
///
/// The caller must hold the collection's lock.
pub fn sweep_collection(dir: &Path, logger: &dyn Logger) -> io::Result<usize> {
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_temp_file(name) {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => {}
            // Gone already; nothing left to clean
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        }
        logger.info(
            "TEMP_FILE_REMOVED",
            &[("path", &path.display().to_string())],
        );
        removed += 1;
    }

    Ok(removed)
}
