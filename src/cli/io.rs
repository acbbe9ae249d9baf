//! JSON output for the CLI
//!
//! The pass outcome is written to stdout as a single JSON object.

use std::io::Write;

use serde_json::Value;

use super::errors::CliResult;

/// Write a success response to `writer`
pub fn write_response_to<W: Write>(data: Value, writer: &mut W) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
