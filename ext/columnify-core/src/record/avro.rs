use super::{CanonicalRecord, Decoder, Value};
use crate::{ColumnifyError, Position, Result};
use apache_avro::types::Value as AvroValue;
use std::io::{BufReader, Read};

/// Avro object container files
///
/// The container header is read lazily on the first call to `decode_next`,
/// and the writer schema embedded in it drives decoding.
pub struct AvroDecoder<R: Read> {
    source: Option<R>,
    reader: Option<apache_avro::Reader<'static, BufReader<R>>>,
    index: u64,
}

impl<R: Read> AvroDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            source: Some(reader),
            reader: None,
            index: 0,
        }
    }
}

impl<R: Read> Decoder for AvroDecoder<R> {
    fn decode_next(&mut self) -> Result<Option<CanonicalRecord>> {
        if let Some(source) = self.source.take() {
            let reader = apache_avro::Reader::new(BufReader::new(source)).map_err(|e| {
                ColumnifyError::decode(
                    Position::record(1).with_byte(0),
                    format!("invalid avro container: {}", e),
                )
            })?;
            self.reader = Some(reader);
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let position = Position::record(self.index + 1);
        let value = match reader.next() {
            None => return Ok(None),
            Some(value) => value.map_err(|e| ColumnifyError::decode(position, e.to_string()))?,
        };
        self.index += 1;

        match from_avro(value) {
            Ok(Value::Map(record)) => Ok(Some(record)),
            Ok(other) => Err(ColumnifyError::unconvertible(format!(
                "{}: top-level avro value is a {}, not a record",
                position,
                other.type_name()
            ))),
            Err(msg) => Err(ColumnifyError::unconvertible(format!("{}: {}", position, msg))),
        }
    }
}

fn from_avro(value: AvroValue) -> std::result::Result<Value, String> {
    Ok(match value {
        AvroValue::Null => Value::Null,
        AvroValue::Boolean(b) => Value::Boolean(b),
        AvroValue::Int(i) | AvroValue::Date(i) | AvroValue::TimeMillis(i) => {
            Value::Integer(i64::from(i))
        }
        AvroValue::Long(l)
        | AvroValue::TimeMicros(l)
        | AvroValue::TimestampMillis(l)
        | AvroValue::TimestampMicros(l)
        | AvroValue::LocalTimestampMillis(l)
        | AvroValue::LocalTimestampMicros(l) => Value::Integer(l),
        AvroValue::Float(f) => Value::Float(f64::from(f)),
        AvroValue::Double(d) => Value::Float(d),
        AvroValue::Bytes(b) | AvroValue::Fixed(_, b) => Value::Bytes(b),
        AvroValue::String(s) | AvroValue::Enum(_, s) => Value::String(s),
        AvroValue::Uuid(u) => Value::String(u.to_string()),
        AvroValue::Union(_, inner) => from_avro(*inner)?,
        AvroValue::Array(items) => Value::List(
            items
                .into_iter()
                .map(from_avro)
                .collect::<std::result::Result<_, _>>()?,
        ),
        AvroValue::Map(entries) => {
            // Avro maps are unordered; sort so output is deterministic
            let mut entries: Vec<_> = entries.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((k, from_avro(v)?)))
                    .collect::<std::result::Result<_, String>>()?,
            )
        }
        AvroValue::Record(fields) => Value::Map(
            fields
                .into_iter()
                .map(|(k, v)| Ok((k, from_avro(v)?)))
                .collect::<std::result::Result<_, String>>()?,
        ),
        other => return Err(format!("avro value {:?} has no canonical form", other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use apache_avro::types::Record;
    use apache_avro::{Schema, Writer};

    const SCHEMA: &str = r#"{
        "type": "record",
        "name": "user",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "name", "type": ["null", "string"]},
            {"name": "tags", "type": {"type": "array", "items": "string"}},
            {"name": "day", "type": {"type": "int", "logicalType": "date"}}
        ]
    }"#;

    fn container(rows: &[(i64, Option<&str>)]) -> Vec<u8> {
        let schema = Schema::parse_str(SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        for (id, name) in rows {
            let mut record = Record::new(writer.schema()).unwrap();
            record.put("id", *id);
            record.put("name", *name);
            record.put("tags", AvroValue::Array(vec![AvroValue::String("x".to_string())]));
            record.put("day", AvroValue::Date(19_000));
            writer.append(record).unwrap();
        }
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_container_records() {
        let data = container(&[(1, Some("Alice")), (2, None)]);
        let mut decoder = AvroDecoder::new(data.as_slice());

        let first = decoder.decode_next().unwrap().unwrap();
        assert_eq!(first["id"], Value::Integer(1));
        assert_eq!(first["name"], Value::String("Alice".to_string()));
        assert_eq!(first["tags"], Value::List(vec![Value::String("x".to_string())]));
        assert_eq!(first["day"], Value::Integer(19_000));

        let second = decoder.decode_next().unwrap().unwrap();
        assert_eq!(second["name"], Value::Null);

        assert!(decoder.decode_next().unwrap().is_none());
    }

    #[test]
    fn test_not_a_container() {
        let mut decoder = AvroDecoder::new("{\"id\": 1}".as_bytes());
        let err = decoder.decode_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_map_keys_are_sorted() {
        let value = AvroValue::Map(
            [
                ("b".to_string(), AvroValue::Int(2)),
                ("a".to_string(), AvroValue::Int(1)),
            ]
            .into_iter()
            .collect(),
        );
        let Value::Map(map) = from_avro(value).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
