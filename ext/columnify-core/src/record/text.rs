//! Helpers shared by the line- and cell-oriented text decoders

use super::Value;
use crate::schema::{PrimitiveType, SchemaNode};
use crate::{ColumnifyError, Position, Result};
use std::io::{BufRead, BufReader, Read};

/// Reads newline-terminated lines while tracking line numbers and byte offsets
pub(super) struct LineReader<R: Read> {
    reader: BufReader<R>,
    buf: String,
    line: u64,
    offset: u64,
}

impl<R: Read> LineReader<R> {
    pub(super) fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: String::new(),
            line: 0,
            offset: 0,
        }
    }

    /// Next line without its terminator, skipping whitespace-only lines
    ///
    /// `record` is the 1-based index the caller will assign to the line,
    /// used only to position read failures.
    pub(super) fn next_line(&mut self, record: u64) -> Result<Option<(&str, Position)>> {
        loop {
            self.buf.clear();
            let start = self.offset;
            let read = self.reader.read_line(&mut self.buf).map_err(|e| {
                ColumnifyError::decode(
                    Position::record(record)
                        .with_line(self.line + 1)
                        .with_byte(start),
                    e.to_string(),
                )
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.line += 1;
            self.offset += read as u64;

            if !self.buf.trim().is_empty() {
                let position = Position::record(record)
                    .with_line(self.line)
                    .with_byte(start);
                let line = self.buf.trim_end_matches(['\n', '\r']);
                return Ok(Some((line, position)));
            }
        }
    }
}

/// Type one text cell according to its schema field
///
/// Empty cells are null for nullable fields that are not strings. Nested
/// fields are expected to hold a JSON document.
pub(super) fn typed_cell(cell: &str, field: &SchemaNode) -> std::result::Result<Value, String> {
    let primitive_type = match field {
        SchemaNode::Primitive { primitive_type, .. } => *primitive_type,
        _ => {
            if cell.is_empty() && field.is_nullable() {
                return Ok(Value::Null);
            }
            let json: serde_json::Value = serde_json::from_str(cell)
                .map_err(|e| format!("nested value is not valid JSON: {}", e))?;
            return Value::from_json(json);
        }
    };

    if cell.is_empty() && field.is_nullable() && primitive_type != PrimitiveType::String {
        return Ok(Value::Null);
    }

    match primitive_type {
        PrimitiveType::String => Ok(Value::String(cell.to_string())),
        PrimitiveType::Binary => Ok(Value::Bytes(cell.as_bytes().to_vec())),
        PrimitiveType::Boolean => parse_bool(cell)
            .map(Value::Boolean)
            .ok_or_else(|| format!("'{}' is not a boolean", cell)),
        PrimitiveType::Int32 | PrimitiveType::Int64 => cell
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| format!("'{}' is not an integer: {}", cell, e)),
        PrimitiveType::Float32 | PrimitiveType::Float64 => cell
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| format!("'{}' is not a number: {}", cell, e)),
        // Temporal cells are either epoch-based integers or ISO text; the
        // writer resolves the latter.
        _ => Ok(cell
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::String(cell.to_string()))),
    }
}

/// Same spellings Go's `strconv.ParseBool` accepts
fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
