//! # Storage Driver
//!
//! Stores documents as files:
//!
//! ```text
//! <root>/<collection>/<resource>.json          final document
//! <root>/<collection>/<resource>.json.tmp      transient write buffer
//! ```
//!
//! Writes and deletes on the same collection are serialized through a
//! per-collection lock. Writes are atomic via temp-file-then-rename. Reads
//! take no lock.

mod codec;
#[allow(clippy::module_inception)]
mod driver;
pub mod errors;
pub mod locks;
pub mod resolver;
pub mod sweep;

pub use codec::{decode, encode, INDENT};
pub use driver::{Driver, DriverOptions};
pub use errors::{DriverError, DriverResult};
pub use locks::{CollectionLock, LockRegistry};
pub use resolver::{resolve, Resolved, STORED_SUFFIX, TEMP_SUFFIX};

pub use crate::crash_point::FaultPoints;
