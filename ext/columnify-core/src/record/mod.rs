//! Row-oriented input formats and the canonical record model
//!
//! Every supported format decodes into the same [`CanonicalRecord`]: an
//! insertion-ordered map from field name to [`Value`]. Which decoder runs is
//! decided by a [`RecordType`], a closed set of formats parsed from a tag
//! before any input is touched.

mod avro;
mod converter;
mod csv;
mod jsonl;
mod ltsv;
mod msgpack;
mod text;

pub use self::avro::AvroDecoder;
pub use self::converter::{JsonStringConverter, TransportValue};
pub use self::csv::{CsvDecoder, CSV_DELIMITER, TSV_DELIMITER};
pub use self::jsonl::JsonlDecoder;
pub use self::ltsv::LtsvDecoder;
pub use self::msgpack::MsgpackDecoder;

use crate::{ColumnifyError, IntermediateSchema, Result};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use indexmap::IndexMap;
use serde::ser::{Error as _, Serialize, Serializer};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// One decoded input record, keyed by field name
pub type CanonicalRecord = IndexMap<String, Value>;

/// A format-independent value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(CanonicalRecord),
}

impl Value {
    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
        }
    }

    /// Convert a parsed JSON document into a canonical value
    ///
    /// Unsigned integers beyond `i64::MAX` have no lossless canonical form.
    pub fn from_json(json: serde_json::Value) -> std::result::Result<Value, String> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if n.is_u64() {
                    return Err(format!("integer {} does not fit in 64 signed bits", n));
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<std::result::Result<_, _>>()?,
            ),
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((k, Value::from_json(v)?)))
                    .collect::<std::result::Result<_, String>>()?,
            ),
        })
    }
}

/// Transport encoding: JSON, with bytes as base64 and no non-finite floats
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) => Err(S::Error::custom(format!(
                "float {} has no transport representation",
                f
            ))),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&BASE64_STANDARD.encode(b)),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(entries) => serializer.collect_map(entries),
        }
    }
}

/// Source formats a record stream can be encoded in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Avro,
    Csv,
    Jsonl,
    Ltsv,
    Msgpack,
    Tsv,
}

impl RecordType {
    pub const ALL: [RecordType; 6] = [
        RecordType::Avro,
        RecordType::Csv,
        RecordType::Jsonl,
        RecordType::Ltsv,
        RecordType::Msgpack,
        RecordType::Tsv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Avro => "avro",
            RecordType::Csv => "csv",
            RecordType::Jsonl => "jsonl",
            RecordType::Ltsv => "ltsv",
            RecordType::Msgpack => "msgpack",
            RecordType::Tsv => "tsv",
        }
    }
}

impl FromStr for RecordType {
    type Err = ColumnifyError;

    fn from_str(s: &str) -> Result<Self> {
        RecordType::ALL
            .into_iter()
            .find(|rt| rt.as_str() == s)
            .ok_or_else(|| ColumnifyError::unsupported_record(s))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pulls canonical records out of one input stream
pub trait Decoder {
    /// Decode the next record
    ///
    /// Returns `Ok(None)` once the input is cleanly exhausted.
    fn decode_next(&mut self) -> Result<Option<CanonicalRecord>>;
}

/// One decoder per [`RecordType`]
pub enum RecordDecoder<R: Read> {
    Avro(AvroDecoder<R>),
    Csv(CsvDecoder<R>),
    Jsonl(JsonlDecoder<R>),
    Ltsv(LtsvDecoder<R>),
    Msgpack(MsgpackDecoder<R>),
}

impl<R: Read> RecordDecoder<R> {
    /// Bind the decoder for `record_type` to a stream
    ///
    /// No bytes are read until the first call to `decode_next`.
    pub fn new(reader: R, schema: &IntermediateSchema, record_type: RecordType) -> Self {
        match record_type {
            RecordType::Avro => RecordDecoder::Avro(AvroDecoder::new(reader)),
            RecordType::Csv => RecordDecoder::Csv(CsvDecoder::new(reader, schema, CSV_DELIMITER)),
            RecordType::Jsonl => RecordDecoder::Jsonl(JsonlDecoder::new(reader)),
            RecordType::Ltsv => RecordDecoder::Ltsv(LtsvDecoder::new(reader, schema)),
            RecordType::Msgpack => RecordDecoder::Msgpack(MsgpackDecoder::new(reader)),
            RecordType::Tsv => RecordDecoder::Csv(CsvDecoder::new(reader, schema, TSV_DELIMITER)),
        }
    }
}

impl<R: Read> Decoder for RecordDecoder<R> {
    fn decode_next(&mut self) -> Result<Option<CanonicalRecord>> {
        match self {
            RecordDecoder::Avro(d) => d.decode_next(),
            RecordDecoder::Csv(d) => d.decode_next(),
            RecordDecoder::Jsonl(d) => d.decode_next(),
            RecordDecoder::Ltsv(d) => d.decode_next(),
            RecordDecoder::Msgpack(d) => d.decode_next(),
        }
    }
}
