//! Storage driver
//!
//! Maps `(collection, resource)` to `<root>/<collection>/<resource>.json`.
//!
//! Write protocol:
//! 1. Validate identifiers
//! 2. Take the collection lock
//! 3. Serialize the document, then create the collection directory
//! 4. Write `<resource>.json.tmp` and fsync it
//! 5. Rename it over `<resource>.json`
//!
//! The rename is the only mutation of the final path, so readers see either
//! the previous document or the new one. Reads take no lock.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::codec;
use super::errors::{DriverError, DriverResult};
use super::locks::{self, LockRegistry};
use super::resolver::{self, Resolved, STORED_SUFFIX, TEMP_SUFFIX};
use super::sweep;
use crate::crash_point::{points, FaultPoints};
use crate::observability::{default_logger, SharedLogger};

/// Options accepted by [`Driver::open`]
#[derive(Clone, Default)]
pub struct DriverOptions {
    /// Diagnostic logger; a console logger at INFO is used when absent
    pub logger: Option<SharedLogger>,
    /// Remove orphaned temp files while opening
    pub sweep_on_open: bool,
    /// Points at which to fail with an injected I/O error
    pub fault_points: FaultPoints,
}

impl DriverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_sweep_on_open(mut self, sweep: bool) -> Self {
        self.sweep_on_open = sweep;
        self
    }

    pub fn with_fault_points(mut self, faults: FaultPoints) -> Self {
        self.fault_points = faults;
        self
    }
}

impl fmt::Debug for DriverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverOptions")
            .field("logger", &self.logger.as_ref().map(|_| "<logger>"))
            .field("sweep_on_open", &self.sweep_on_open)
            .field("fault_points", &self.fault_points)
            .finish()
    }
}

/// File-backed document store rooted at one directory
pub struct Driver {
    root: PathBuf,
    locks: LockRegistry,
    logger: SharedLogger,
    faults: FaultPoints,
}

impl Driver {
    /// Open a driver rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Io` if the root cannot be inspected or created,
    /// or if the open-time sweep fails.
    pub fn open(root: impl AsRef<Path>, options: DriverOptions) -> DriverResult<Self> {
        let root = normalize(root.as_ref());
        let logger = options.logger.unwrap_or_else(default_logger);
        let root_display = root.display().to_string();

        match fs::metadata(&root) {
            Ok(_) => {
                logger.debug("DRIVER_OPEN_EXISTING", &[("root", &root_display)]);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                logger.debug("DRIVER_OPEN_CREATED", &[("root", &root_display)]);
                fs::create_dir_all(&root).map_err(|e| {
                    DriverError::io(
                        format!("failed to create root directory {}", root_display),
                        e,
                    )
                })?;
            }
            Err(e) => {
                return Err(DriverError::io(
                    format!("failed to inspect root directory {}", root_display),
                    e,
                ))
            }
        }

        let driver = Self {
            root,
            locks: LockRegistry::new(),
            logger,
            faults: options.fault_points,
        };

        if options.sweep_on_open {
            driver.sweep_temp_files()?;
        }

        Ok(driver)
    }

    /// The normalized root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `document` as `resource` in `collection`, replacing any
    /// previous version.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        resource: &str,
        document: &T,
    ) -> DriverResult<()> {
        validate_collection(collection)?;
        validate_resource(resource)?;

        let handle = self.locks.acquire(collection);
        let _guard = locks::lock(&handle);

        let bytes = codec::encode(document)?;

        let dir = self.root.join(collection);
        fs::create_dir_all(&dir).map_err(|e| {
            DriverError::io(
                format!("failed to create collection directory {}", dir.display()),
                e,
            )
        })?;

        let final_path = resolver::with_suffix(&dir.join(resource), STORED_SUFFIX);
        let temp_path = resolver::with_suffix(&final_path, TEMP_SUFFIX);

        self.fault(points::WRITE_BEFORE_TEMP, &temp_path)?;
        write_synced(&temp_path, &bytes).map_err(|e| {
            DriverError::io(
                format!("failed to write temp file {}", temp_path.display()),
                e,
            )
        })?;

        self.fault(points::WRITE_BEFORE_RENAME, &temp_path)?;
        fs::rename(&temp_path, &final_path).map_err(|e| {
            DriverError::io(
                format!(
                    "failed to rename {} to {}",
                    temp_path.display(),
                    final_path.display()
                ),
                e,
            )
        })?;
        self.fault(points::WRITE_AFTER_RENAME, &final_path)?;

        sync_dir(&dir).map_err(|e| {
            DriverError::io(
                format!("failed to fsync collection directory {}", dir.display()),
                e,
            )
        })
    }

    /// Return the stored text of a resource.
    ///
    /// `resource` may be given with or without the `.json` suffix.
    pub fn read(&self, collection: &str, resource: &str) -> DriverResult<String> {
        validate_collection(collection)?;
        validate_resource(resource)?;

        let resolved = self.resolve(&self.root.join(collection).join(resource))?;
        read_text(&resolved.path)
    }

    /// Read a resource and decode it
    pub fn read_as<T: DeserializeOwned>(&self, collection: &str, resource: &str) -> DriverResult<T> {
        let text = self.read(collection, resource)?;
        codec::decode(&text)
    }

    /// Return the stored text of every entry in a collection, in directory
    /// enumeration order.
    ///
    /// The first unreadable entry aborts the whole call. An existing but
    /// empty collection yields an empty vector.
    pub fn read_all(&self, collection: &str) -> DriverResult<Vec<String>> {
        validate_collection(collection)?;

        // Collection directories never carry the stored suffix, so the
        // fallback here only matters for hand-made layouts.
        let resolved = self.resolve(&self.root.join(collection))?;

        let entries = fs::read_dir(&resolved.path).map_err(|e| {
            DriverError::io(
                format!("failed to list collection {}", resolved.path.display()),
                e,
            )
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                DriverError::io(
                    format!("failed to list collection {}", resolved.path.display()),
                    e,
                )
            })?;
            let path = entry.path();
            let text = fs::read_to_string(&path).map_err(|e| {
                DriverError::io(format!("failed to read {}", path.display()), e)
            })?;
            records.push(text);
        }

        Ok(records)
    }

    /// Read every entry in a collection and decode each one
    pub fn read_all_as<T: DeserializeOwned>(&self, collection: &str) -> DriverResult<Vec<T>> {
        self.read_all(collection)?
            .iter()
            .map(|text| codec::decode(text))
            .collect()
    }

    /// Remove a resource.
    ///
    /// If the resolved target is a directory it is removed recursively; this
    /// keeps compatibility with callers that delete nested directories by
    /// name. Use [`Driver::delete_collection`] to drop a whole collection.
    pub fn delete(&self, collection: &str, resource: &str) -> DriverResult<()> {
        validate_collection(collection)?;
        validate_resource(resource)?;

        let handle = self.locks.acquire(collection);
        let _guard = locks::lock(&handle);

        let resolved = self.resolve(&self.root.join(collection).join(resource))?;
        self.fault(points::DELETE_BEFORE_REMOVE, &resolved.path)?;

        let result = if resolved.is_dir() {
            fs::remove_dir_all(&resolved.path)
        } else {
            fs::remove_file(&resolved.path)
        };

        result.map_err(|e| {
            DriverError::io(format!("failed to remove {}", resolved.path.display()), e)
        })
    }

    /// Remove a collection directory and everything in it
    pub fn delete_collection(&self, collection: &str) -> DriverResult<()> {
        validate_collection(collection)?;

        let handle = self.locks.acquire(collection);
        let _guard = locks::lock(&handle);

        let dir = self.root.join(collection);
        match fs::metadata(&dir) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(DriverError::NotFound(dir)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DriverError::NotFound(dir))
            }
            Err(e) => {
                return Err(DriverError::io(
                    format!("failed to inspect {}", dir.display()),
                    e,
                ))
            }
        }

        fs::remove_dir_all(&dir)
            .map_err(|e| DriverError::io(format!("failed to remove {}", dir.display()), e))
    }

    /// Remove orphaned `*.json.tmp` files from every collection.
    ///
    /// Each collection is swept while holding its lock, so no write in this
    /// process can be mid-flight for it.
    pub fn sweep_temp_files(&self) -> DriverResult<usize> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            DriverError::io(format!("failed to list root {}", self.root.display()), e)
        })?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| {
                DriverError::io(format!("failed to list root {}", self.root.display()), e)
            })?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let collection = entry.file_name().to_string_lossy().into_owned();

            let handle = self.locks.acquire(&collection);
            let _guard = locks::lock(&handle);
            removed += sweep::sweep_collection(&path, &*self.logger).map_err(|e| {
                DriverError::io(format!("failed to sweep {}", path.display()), e)
            })?;
        }

        self.logger.info(
            "TEMP_SWEEP_COMPLETE",
            &[
                ("removed", &removed.to_string()),
                ("root", &self.root.display().to_string()),
            ],
        );
        Ok(removed)
    }

    fn resolve(&self, target: &Path) -> DriverResult<Resolved> {
        resolver::resolve(target)
            .map_err(|e| DriverError::io(format!("failed to stat {}", target.display()), e))?
            .ok_or_else(|| DriverError::NotFound(target.to_path_buf()))
    }

    fn fault(&self, point: &str, path: &Path) -> DriverResult<()> {
        self.faults
            .check(point)
            .map_err(|e| DriverError::io(format!("fault at {}", path.display()), e))
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("root", &self.root)
            .field("collections", &self.locks.len())
            .finish_non_exhaustive()
    }
}

fn validate_collection(collection: &str) -> DriverResult<()> {
    if collection.is_empty() {
        return Err(DriverError::missing_collection());
    }
    validate_component("collection", collection)
}

fn validate_resource(resource: &str) -> DriverResult<()> {
    if resource.is_empty() {
        return Err(DriverError::missing_resource());
    }
    validate_component("resource", resource)
}

/// Identifiers name exactly one directory entry below their parent
fn validate_component(kind: &str, id: &str) -> DriverResult<()> {
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == id => Ok(()),
        _ => Err(DriverError::Validation(format!(
            "invalid {} identifier '{}': must be a single path component",
            kind, id
        ))),
    }
}

/// Lexically clean a path: drop `.` components and fold `name/..` pairs
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

fn read_text(path: &Path) -> DriverResult<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            DriverError::NotFound(path.to_path_buf())
        } else {
            DriverError::io(format!("failed to read {}", path.display()), e)
        }
    })
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
