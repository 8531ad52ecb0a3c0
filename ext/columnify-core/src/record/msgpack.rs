use super::{CanonicalRecord, Decoder, Value};
use crate::{ColumnifyError, Position, Result};
use std::io::{self, BufRead, BufReader, Read};

/// A stream of concatenated MessagePack maps
pub struct MsgpackDecoder<R: Read> {
    reader: BufReader<CountingReader<R>>,
    index: u64,
}

/// Counts bytes handed to the buffered reader above it
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

impl<R: Read> MsgpackDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(CountingReader {
                inner: reader,
                count: 0,
            }),
            index: 0,
        }
    }

    /// Offset of the next unread byte
    fn offset(&self) -> u64 {
        self.reader.get_ref().count - self.reader.buffer().len() as u64
    }
}

impl<R: Read> Decoder for MsgpackDecoder<R> {
    fn decode_next(&mut self) -> Result<Option<CanonicalRecord>> {
        let start = self.offset();
        let position = Position::record(self.index + 1).with_byte(start);

        let at_end = self
            .reader
            .fill_buf()
            .map_err(|e| ColumnifyError::decode(position, e.to_string()))?
            .is_empty();
        if at_end {
            return Ok(None);
        }

        let value = rmpv::decode::read_value(&mut self.reader)
            .map_err(|e| ColumnifyError::decode(position, format!("invalid msgpack: {}", e)))?;
        self.index += 1;

        match from_msgpack(value) {
            Ok(Value::Map(record)) => Ok(Some(record)),
            Ok(other) => Err(ColumnifyError::decode(
                position,
                format!("expected a msgpack map, found {}", other.type_name()),
            )),
            Err(msg) => Err(ColumnifyError::unconvertible(format!("{}: {}", position, msg))),
        }
    }
}

fn from_msgpack(value: rmpv::Value) -> std::result::Result<Value, String> {
    Ok(match value {
        rmpv::Value::Nil => Value::Null,
        rmpv::Value::Boolean(b) => Value::Boolean(b),
        rmpv::Value::Integer(i) => match i.as_i64() {
            Some(i) => Value::Integer(i),
            None => return Err(format!("integer {} does not fit in 64 signed bits", i)),
        },
        rmpv::Value::F32(f) => Value::Float(f64::from(f)),
        rmpv::Value::F64(f) => Value::Float(f),
        rmpv::Value::String(s) => match s.into_str() {
            Some(s) => Value::String(s),
            None => return Err("string is not valid UTF-8".to_string()),
        },
        rmpv::Value::Binary(b) => Value::Bytes(b),
        rmpv::Value::Array(items) => Value::List(
            items
                .into_iter()
                .map(from_msgpack)
                .collect::<std::result::Result<_, _>>()?,
        ),
        rmpv::Value::Map(entries) => {
            let mut map = CanonicalRecord::with_capacity(entries.len());
            for (key, value) in entries {
                let key = match key {
                    rmpv::Value::String(s) => s
                        .into_str()
                        .ok_or_else(|| "map key is not valid UTF-8".to_string())?,
                    other => return Err(format!("map key {} is not a string", other)),
                };
                map.insert(key, from_msgpack(value)?);
            }
            Value::Map(map)
        }
        rmpv::Value::Ext(tag, _) => {
            return Err(format!("extension type {} has no canonical form", tag))
        }
    })
}
