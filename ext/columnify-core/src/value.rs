use bytes::Bytes;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// A single column value, already typed by the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParquetValue {
    // Numeric types
    Int32(i32),
    Int64(i64),
    Float32(OrderedFloat<f32>),
    Float64(OrderedFloat<f64>),

    // Basic types
    Boolean(bool),
    String(Arc<str>),
    Bytes(Bytes),

    // Date/Time types
    Date32(i32),          // Days since epoch
    TimeMillis(i32),      // Milliseconds since midnight
    TimeMicros(i64),      // Microseconds since midnight
    TimestampMillis(i64), // Milliseconds since epoch, UTC
    TimestampMicros(i64), // Microseconds since epoch, UTC

    // Complex types
    List(Vec<ParquetValue>),
    Map(Vec<(ParquetValue, ParquetValue)>), // Vec of tuples keeps input ordering
    Record(IndexMap<Arc<str>, ParquetValue>), // For struct types, preserves field order

    Null,
}

impl ParquetValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, ParquetValue::Null)
    }

    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            ParquetValue::Int32(_) => "Int32",
            ParquetValue::Int64(_) => "Int64",
            ParquetValue::Float32(_) => "Float32",
            ParquetValue::Float64(_) => "Float64",
            ParquetValue::Boolean(_) => "Boolean",
            ParquetValue::String(_) => "String",
            ParquetValue::Bytes(_) => "Bytes",
            ParquetValue::Date32(_) => "Date32",
            ParquetValue::TimeMillis(_) => "TimeMillis",
            ParquetValue::TimeMicros(_) => "TimeMicros",
            ParquetValue::TimestampMillis(_) => "TimestampMillis",
            ParquetValue::TimestampMicros(_) => "TimestampMicros",
            ParquetValue::List(_) => "List",
            ParquetValue::Map(_) => "Map",
            ParquetValue::Record(_) => "Record",
            ParquetValue::Null => "Null",
        }
    }

    /// Plain-encoded size of this value in bytes
    ///
    /// Fixed-width values count their width, strings and binary count a
    /// 4-byte length prefix plus their bytes, nulls count nothing, and nested
    /// values count the sum of their children. The result depends only on the
    /// value, never on compression or on when row groups are flushed.
    pub fn encoded_size(&self) -> u64 {
        match self {
            ParquetValue::Null => 0,
            ParquetValue::Boolean(_) => 1,
            ParquetValue::Int32(_)
            | ParquetValue::Float32(_)
            | ParquetValue::Date32(_)
            | ParquetValue::TimeMillis(_) => 4,
            ParquetValue::Int64(_)
            | ParquetValue::Float64(_)
            | ParquetValue::TimeMicros(_)
            | ParquetValue::TimestampMillis(_)
            | ParquetValue::TimestampMicros(_) => 8,
            ParquetValue::String(s) => 4 + s.len() as u64,
            ParquetValue::Bytes(b) => 4 + b.len() as u64,
            ParquetValue::List(items) => items.iter().map(ParquetValue::encoded_size).sum(),
            ParquetValue::Map(entries) => entries
                .iter()
                .map(|(k, v)| k.encoded_size() + v.encoded_size())
                .sum(),
            ParquetValue::Record(fields) => fields.values().map(ParquetValue::encoded_size).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        let v = ParquetValue::Int32(42);
        assert_eq!(v, ParquetValue::Int32(42));
        assert!(!v.is_null());
        assert_eq!(v.type_name(), "Int32");
    }

    #[test]
    fn test_null_value() {
        let v = ParquetValue::Null;
        assert!(v.is_null());
        assert_eq!(v.type_name(), "Null");
        assert_eq!(v.encoded_size(), 0);
    }

    #[test]
    fn test_float_equality() {
        let v1 = ParquetValue::Float32(OrderedFloat(3.5));
        let v2 = ParquetValue::Float32(OrderedFloat(3.5));
        assert_eq!(v1, v2);
    }

    #[test]
    fn test_encoded_size() {
        assert_eq!(ParquetValue::Boolean(true).encoded_size(), 1);
        assert_eq!(ParquetValue::Int64(1).encoded_size(), 8);
        assert_eq!(ParquetValue::String(Arc::from("Alice")).encoded_size(), 9);

        let list = ParquetValue::List(vec![ParquetValue::Int32(1), ParquetValue::Int32(2)]);
        assert_eq!(list.encoded_size(), 8);

        let map = ParquetValue::Map(vec![(
            ParquetValue::String(Arc::from("k")),
            ParquetValue::Int64(42),
        )]);
        assert_eq!(map.encoded_size(), 13);
    }
}
