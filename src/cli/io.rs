//! Stdin documents and stdout envelopes for one-shot commands
//!
//! `write` takes the document to store on stdin. Every command prints exactly
//! one envelope line on stdout, success or failure; logs never go there.

use std::io::{self, Read, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Read a whole JSON document from a reader (stdin in production)
pub fn read_document<R: Read>(reader: &mut R) -> CliResult<Value> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    let value: Value = serde_json::from_str(&input)?;
    Ok(value)
}

/// Print `{"status": "ok", "data": ...}` as the command's only stdout line
pub fn write_response(data: Value) -> CliResult<()> {
    emit(&mut io::stdout().lock(), &ok_envelope(data))
}

/// Print `{"status": "error", "code": ..., "message": ...}` on stdout.
///
/// Scripts read the code from here; `main` repeats the message on stderr.
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    emit(&mut io::stdout().lock(), &error_envelope(code, message))
}

fn ok_envelope(data: Value) -> Value {
    json!({ "status": "ok", "data": data })
}

fn error_envelope(code: &str, message: &str) -> Value {
    json!({ "status": "error", "code": code, "message": message })
}

/// Compact JSON plus a newline, flushed before returning
fn emit<W: Write>(out: &mut W, envelope: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, envelope)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
