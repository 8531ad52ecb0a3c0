use super::text::LineReader;
use super::{CanonicalRecord, Decoder, Value};
use crate::{ColumnifyError, Result};
use std::io::Read;

/// One JSON object per line; blank lines are skipped
pub struct JsonlDecoder<R: Read> {
    lines: LineReader<R>,
    index: u64,
}

impl<R: Read> JsonlDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: LineReader::new(reader),
            index: 0,
        }
    }
}

impl<R: Read> Decoder for JsonlDecoder<R> {
    fn decode_next(&mut self) -> Result<Option<CanonicalRecord>> {
        let Some((line, position)) = self.lines.next_line(self.index + 1)? else {
            return Ok(None);
        };
        self.index += 1;

        let json: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| ColumnifyError::decode(position, format!("invalid JSON: {}", e)))?;

        match Value::from_json(json) {
            Ok(Value::Map(record)) => Ok(Some(record)),
            Ok(other) => Err(ColumnifyError::decode(
                position,
                format!("expected a JSON object, found {}", other.type_name()),
            )),
            Err(msg) => Err(ColumnifyError::unconvertible(format!("{}: {}", position, msg))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_objects_and_blank_lines() {
        let input = "{\"id\": 1, \"tags\": [\"a\"]}\n\n{\"id\": 2, \"extra\": null}\n";
        let mut decoder = JsonlDecoder::new(input.as_bytes());

        let first = decoder.decode_next().unwrap().unwrap();
        assert_eq!(first["id"], Value::Integer(1));
        assert_eq!(
            first["tags"],
            Value::List(vec![Value::String("a".to_string())])
        );

        let second = decoder.decode_next().unwrap().unwrap();
        assert_eq!(second["extra"], Value::Null);

        assert!(decoder.decode_next().unwrap().is_none());
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut decoder = JsonlDecoder::new("{\"id\": 1}".as_bytes());
        assert!(decoder.decode_next().unwrap().is_some());
        assert!(decoder.decode_next().unwrap().is_none());
    }

    #[test]
    fn test_malformed_lines() {
        let mut decoder = JsonlDecoder::new("{\"id\": 1}\n{\"id\": \n".as_bytes());
        decoder.decode_next().unwrap();
        let err = decoder.decode_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.position().unwrap().line, Some(2));

        let mut decoder = JsonlDecoder::new("[1, 2]\n".as_bytes());
        let err = decoder.decode_next().unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[test]
    fn test_unsigned_overflow_is_unconvertible() {
        let mut decoder = JsonlDecoder::new("{\"n\": 18446744073709551615}\n".as_bytes());
        let err = decoder.decode_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnconvertibleRecord);
    }
}
