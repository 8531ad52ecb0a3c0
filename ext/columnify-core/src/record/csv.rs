use super::text::typed_cell;
use super::{CanonicalRecord, Decoder};
use crate::schema::{IntermediateSchema, SchemaNode};
use crate::{ColumnifyError, Position, Result};
use std::io::Read;

pub const CSV_DELIMITER: u8 = b',';
pub const TSV_DELIMITER: u8 = b'\t';

/// Headerless delimited text, mapped positionally onto the schema fields
///
/// Rows may carry extra trailing cells, which are ignored. A row with fewer
/// cells than the schema has fields is malformed.
pub struct CsvDecoder<R: Read> {
    reader: csv::Reader<R>,
    fields: Vec<SchemaNode>,
    row: csv::StringRecord,
    index: u64,
}

impl<R: Read> CsvDecoder<R> {
    pub fn new(reader: R, schema: &IntermediateSchema, delimiter: u8) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(reader);

        Self {
            reader,
            fields: schema.fields().to_vec(),
            row: csv::StringRecord::new(),
            index: 0,
        }
    }

    fn position(&self) -> Position {
        let position = Position::record(self.index);
        match self.row.position() {
            Some(pos) => position.with_line(pos.line()).with_byte(pos.byte()),
            None => position,
        }
    }
}

impl<R: Read> Decoder for CsvDecoder<R> {
    fn decode_next(&mut self) -> Result<Option<CanonicalRecord>> {
        let has_row = self.reader.read_record(&mut self.row).map_err(|e| {
            let position = Position::record(self.index + 1);
            let position = match e.position() {
                Some(pos) => position.with_line(pos.line()).with_byte(pos.byte()),
                None => position,
            };
            ColumnifyError::decode(position, e.to_string())
        })?;
        if !has_row {
            return Ok(None);
        }
        self.index += 1;

        if self.row.len() < self.fields.len() {
            return Err(ColumnifyError::decode(
                self.position(),
                format!(
                    "row has {} cells but the schema has {} fields",
                    self.row.len(),
                    self.fields.len()
                ),
            ));
        }

        let mut record = CanonicalRecord::with_capacity(self.fields.len());
        for (field, cell) in self.fields.iter().zip(self.row.iter()) {
            let value = typed_cell(cell, field).map_err(|msg| {
                ColumnifyError::decode(self.position(), format!("field '{}': {}", field.name(), msg))
            })?;
            record.insert(field.name().to_string(), value);
        }

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use crate::schema::{PrimitiveType, SchemaBuilder};
    use crate::ErrorKind;

    fn schema() -> IntermediateSchema {
        SchemaBuilder::new("root")
            .with_field(SchemaNode::primitive("id", PrimitiveType::Int64, false))
            .with_field(SchemaNode::primitive("name", PrimitiveType::String, true))
            .build()
            .unwrap()
    }

    #[test]
    fn test_rows_map_onto_fields() {
        let mut decoder = CsvDecoder::new("1,Alice\n2,Bob,extra\n".as_bytes(), &schema(), CSV_DELIMITER);

        let first = decoder.decode_next().unwrap().unwrap();
        assert_eq!(first["id"], Value::Integer(1));
        assert_eq!(first["name"], Value::String("Alice".to_string()));

        let second = decoder.decode_next().unwrap().unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second["name"], Value::String("Bob".to_string()));

        assert!(decoder.decode_next().unwrap().is_none());
    }

    #[test]
    fn test_tsv_and_quoting() {
        let mut decoder = CsvDecoder::new("7\t\"a\tb\"\n".as_bytes(), &schema(), TSV_DELIMITER);
        let record = decoder.decode_next().unwrap().unwrap();
        assert_eq!(record["name"], Value::String("a\tb".to_string()));
    }

    #[test]
    fn test_short_row_reports_position() {
        let mut decoder = CsvDecoder::new("1,Alice\n2\n".as_bytes(), &schema(), CSV_DELIMITER);
        decoder.decode_next().unwrap().unwrap();

        let err = decoder.decode_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        let position = err.position().unwrap();
        assert_eq!(position.record, 2);
        assert_eq!(position.line, Some(2));
        assert_eq!(position.byte, Some(8));
    }

    #[test]
    fn test_bad_cell() {
        let mut decoder = CsvDecoder::new("one,Alice\n".as_bytes(), &schema(), CSV_DELIMITER);
        let err = decoder.decode_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("field 'id'"));
    }
}
