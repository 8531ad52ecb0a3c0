use super::text::{typed_cell, LineReader};
use super::{CanonicalRecord, Decoder, Value};
use crate::schema::{IntermediateSchema, SchemaNode};
use crate::{ColumnifyError, Result};
use std::collections::HashMap;
use std::io::Read;

/// Labeled tab-separated values: `label:value` pairs separated by tabs
///
/// Values of labels the schema declares are typed like CSV cells; other
/// labels are kept as strings.
pub struct LtsvDecoder<R: Read> {
    lines: LineReader<R>,
    fields: HashMap<String, SchemaNode>,
    index: u64,
}

impl<R: Read> LtsvDecoder<R> {
    pub fn new(reader: R, schema: &IntermediateSchema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|f| (f.name().to_string(), f.clone()))
            .collect();

        Self {
            lines: LineReader::new(reader),
            fields,
            index: 0,
        }
    }
}

impl<R: Read> Decoder for LtsvDecoder<R> {
    fn decode_next(&mut self) -> Result<Option<CanonicalRecord>> {
        let Some((line, position)) = self.lines.next_line(self.index + 1)? else {
            return Ok(None);
        };
        self.index += 1;

        let mut record = CanonicalRecord::new();
        for pair in line.split('\t').filter(|pair| !pair.is_empty()) {
            let (label, raw) = pair.split_once(':').ok_or_else(|| {
                ColumnifyError::decode(position, format!("'{}' is not a label:value pair", pair))
            })?;

            let value = match self.fields.get(label) {
                Some(field) => typed_cell(raw, field).map_err(|msg| {
                    ColumnifyError::decode(position, format!("field '{}': {}", label, msg))
                })?,
                None => Value::String(raw.to_string()),
            };
            record.insert(label.to_string(), value);
        }

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PrimitiveType, SchemaBuilder};
    use crate::ErrorKind;

    fn schema() -> IntermediateSchema {
        SchemaBuilder::new("root")
            .with_field(SchemaNode::primitive("id", PrimitiveType::Int64, false))
            .with_field(SchemaNode::primitive("ok", PrimitiveType::Boolean, true))
            .build()
            .unwrap()
    }

    #[test]
    fn test_labels() {
        let mut decoder = LtsvDecoder::new("id:1\tok:true\thost:a:b\n".as_bytes(), &schema());
        let record = decoder.decode_next().unwrap().unwrap();

        assert_eq!(record["id"], Value::Integer(1));
        assert_eq!(record["ok"], Value::Boolean(true));
        assert_eq!(record["host"], Value::String("a:b".to_string()));
        assert!(decoder.decode_next().unwrap().is_none());
    }

    #[test]
    fn test_empty_segments_skipped() {
        let mut decoder = LtsvDecoder::new("id:1\tok:f\t\n\tid:2\t\tok:t\n".as_bytes(), &schema());

        let first = decoder.decode_next().unwrap().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first["ok"], Value::Boolean(false));

        let second = decoder.decode_next().unwrap().unwrap();
        assert_eq!(second["id"], Value::Integer(2));
        assert_eq!(second["ok"], Value::Boolean(true));
    }

    #[test]
    fn test_missing_separator() {
        let mut decoder = LtsvDecoder::new("id:1\tbroken\n".as_bytes(), &schema());
        let err = decoder.decode_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.position().unwrap().record, 1);
    }
}
