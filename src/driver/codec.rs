//! Document serialization
//!
//! Documents are stored as indented JSON. The driver never looks inside them.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;

use super::errors::{DriverError, DriverResult};

/// Indent marker used for stored documents
pub const INDENT: &[u8] = b"\t ";

/// Serialize a document to its stored form
pub fn encode<T: Serialize + ?Sized>(document: &T) -> DriverResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(128);
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    document
        .serialize(&mut ser)
        .map_err(|e| DriverError::Serialization(format!("failed to encode document: {}", e)))?;
    Ok(buf)
}

/// Parse stored text back into a typed document
pub fn decode<T: DeserializeOwned>(text: &str) -> DriverResult<T> {
    serde_json::from_str(text)
        .map_err(|e| DriverError::Serialization(format!("failed to decode document: {}", e)))
}
