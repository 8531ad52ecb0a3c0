use super::{CanonicalRecord, Decoder, RecordDecoder, RecordType};
use crate::{ColumnifyError, IntermediateSchema, Result};
use std::fmt;
use std::io::Read;

/// One record in the writer's input form: a compact JSON object
///
/// Bytes travel as base64 text; everything else keeps its JSON type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportValue(String);

impl TransportValue {
    /// Encode a canonical record
    pub fn encode(record: &CanonicalRecord) -> Result<Self> {
        serde_json::to_string(record)
            .map(TransportValue)
            .map_err(|e| ColumnifyError::unconvertible(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns a record stream into transport values, one record per call
pub struct JsonStringConverter<R: Read> {
    decoder: RecordDecoder<R>,
    converted: u64,
}

impl<R: Read> JsonStringConverter<R> {
    pub fn new(reader: R, schema: &IntermediateSchema, record_type: RecordType) -> Self {
        Self {
            decoder: RecordDecoder::new(reader, schema, record_type),
            converted: 0,
        }
    }

    /// Bind a converter from a record-type tag
    ///
    /// Unknown tags fail here, before any byte of `reader` is consumed.
    pub fn from_tag(reader: R, schema: &IntermediateSchema, record_type: &str) -> Result<Self> {
        Ok(Self::new(reader, schema, record_type.parse()?))
    }

    /// Decode and encode the next record
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    pub fn convert(&mut self) -> Result<Option<TransportValue>> {
        let Some(record) = self.decoder.decode_next()? else {
            return Ok(None);
        };
        self.converted += 1;

        serde_json::to_string(&record)
            .map(|json| Some(TransportValue(json)))
            .map_err(|e| ColumnifyError::unconvertible(format!("record {}: {}", self.converted, e)))
    }

    /// Number of records converted so far
    pub fn converted(&self) -> u64 {
        self.converted
    }
}

impl<R: Read> Iterator for JsonStringConverter<R> {
    type Item = Result<TransportValue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.convert().transpose()
    }
}
