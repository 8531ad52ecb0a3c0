//! Coercion of transport values into typed rows
//!
//! A transport value is a JSON object. Each schema column is looked up by
//! name and coerced to the column's type; missing keys are null and keys
//! the schema does not declare are dropped.

use crate::record::TransportValue;
use crate::schema::{IntermediateSchema, PrimitiveType, SchemaNode};
use crate::{ColumnifyError, ParquetValue, Result};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use bytes::Bytes;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde_json::Value as Json;
use std::sync::Arc;

/// Coerce one transport value into a row ordered like the schema fields
pub fn marshal_row(schema: &IntermediateSchema, value: &TransportValue) -> Result<Vec<ParquetValue>> {
    let json: Json = serde_json::from_str(value.as_str())
        .map_err(|e| ColumnifyError::write(format!("malformed transport value: {}", e)))?;
    let Json::Object(mut object) = json else {
        return Err(ColumnifyError::write("transport value is not a JSON object"));
    };

    schema
        .fields()
        .iter()
        .map(|field| {
            let value = object.remove(field.name()).unwrap_or(Json::Null);
            coerce(value, field, field.name())
        })
        .collect()
}

fn coerce(json: Json, node: &SchemaNode, path: &str) -> Result<ParquetValue> {
    if json.is_null() {
        if node.is_nullable() {
            return Ok(ParquetValue::Null);
        }
        return Err(ColumnifyError::write(format!(
            "null value for required column '{}'",
            path
        )));
    }

    match node {
        SchemaNode::Primitive { primitive_type, .. } => coerce_primitive(json, *primitive_type, path),
        SchemaNode::List { item, .. } => match json {
            Json::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item_json)| coerce(item_json, item, &format!("{}[{}]", path, idx)))
                .collect::<Result<Vec<_>>>()
                .map(ParquetValue::List),
            other => Err(mismatch("List", &other, path)),
        },
        SchemaNode::Map { value, .. } => match json {
            Json::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| {
                    let item = coerce(v, value, &format!("{}.{}", path, k))?;
                    Ok((ParquetValue::String(Arc::from(k)), item))
                })
                .collect::<Result<Vec<_>>>()
                .map(ParquetValue::Map),
            other => Err(mismatch("Map", &other, path)),
        },
        SchemaNode::Struct { fields, .. } => match json {
            Json::Object(mut object) => {
                let mut record = IndexMap::with_capacity(fields.len());
                for field in fields {
                    let value = object.remove(field.name()).unwrap_or(Json::Null);
                    let child_path = format!("{}.{}", path, field.name());
                    record.insert(Arc::from(field.name()), coerce(value, field, &child_path)?);
                }
                Ok(ParquetValue::Record(record))
            }
            other => Err(mismatch("Struct", &other, path)),
        },
    }
}

fn coerce_primitive(json: Json, primitive_type: PrimitiveType, path: &str) -> Result<ParquetValue> {
    let expected = primitive_type.type_name();
    match primitive_type {
        PrimitiveType::Boolean => match json {
            Json::Bool(b) => Ok(ParquetValue::Boolean(b)),
            other => Err(mismatch(expected, &other, path)),
        },
        PrimitiveType::Int32 => int32(&json, path).map(ParquetValue::Int32),
        PrimitiveType::Int64 => integer(&json)
            .map(ParquetValue::Int64)
            .ok_or_else(|| mismatch(expected, &json, path)),
        PrimitiveType::Float32 => json
            .as_f64()
            .map(|f| ParquetValue::Float32(OrderedFloat(f as f32)))
            .ok_or_else(|| mismatch(expected, &json, path)),
        PrimitiveType::Float64 => json
            .as_f64()
            .map(|f| ParquetValue::Float64(OrderedFloat(f)))
            .ok_or_else(|| mismatch(expected, &json, path)),
        PrimitiveType::String => match json {
            Json::String(s) => Ok(ParquetValue::String(Arc::from(s))),
            other => Err(mismatch(expected, &other, path)),
        },
        PrimitiveType::Binary => match json {
            Json::String(s) => BASE64_STANDARD
                .decode(s.as_bytes())
                .map(|b| ParquetValue::Bytes(Bytes::from(b)))
                .map_err(|e| {
                    ColumnifyError::write(format!("column '{}': invalid base64: {}", path, e))
                }),
            other => Err(mismatch(expected, &other, path)),
        },
        PrimitiveType::Date32 => match &json {
            Json::String(s) => parse_date(s, path).map(ParquetValue::Date32),
            _ => int32(&json, path).map(ParquetValue::Date32),
        },
        PrimitiveType::TimeMillis => match &json {
            Json::String(s) => parse_time(s, path)
                .map(|t| ParquetValue::TimeMillis((t / 1_000) as i32)),
            _ => int32(&json, path).map(ParquetValue::TimeMillis),
        },
        PrimitiveType::TimeMicros => match &json {
            Json::String(s) => parse_time(s, path).map(ParquetValue::TimeMicros),
            _ => integer(&json)
                .map(ParquetValue::TimeMicros)
                .ok_or_else(|| mismatch(expected, &json, path)),
        },
        PrimitiveType::TimestampMillis => match &json {
            Json::String(s) => {
                parse_timestamp(s, path).map(|ts| ParquetValue::TimestampMillis(ts.as_millisecond()))
            }
            _ => integer(&json)
                .map(ParquetValue::TimestampMillis)
                .ok_or_else(|| mismatch(expected, &json, path)),
        },
        PrimitiveType::TimestampMicros => match &json {
            Json::String(s) => {
                parse_timestamp(s, path).map(|ts| ParquetValue::TimestampMicros(ts.as_microsecond()))
            }
            _ => integer(&json)
                .map(ParquetValue::TimestampMicros)
                .ok_or_else(|| mismatch(expected, &json, path)),
        },
    }
}

/// Integer view of a JSON number, accepting floats with no fractional part
fn integer(json: &Json) -> Option<i64> {
    match json {
        Json::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

fn int32(json: &Json, path: &str) -> Result<i32> {
    let i = integer(json).ok_or_else(|| mismatch("Int32", json, path))?;
    i32::try_from(i).map_err(|_| {
        ColumnifyError::write(format!(
            "column '{}': {} is out of range for a 32-bit column",
            path, i
        ))
    })
}

fn parse_date(s: &str, path: &str) -> Result<i32> {
    let date: jiff::civil::Date = s
        .parse()
        .map_err(|e| temporal_error("date", s, path, e))?;
    let span = date
        .since(jiff::civil::date(1970, 1, 1))
        .map_err(|e| temporal_error("date", s, path, e))?;
    Ok(span.get_days())
}

/// Microseconds since midnight
fn parse_time(s: &str, path: &str) -> Result<i64> {
    let time: jiff::civil::Time = s
        .parse()
        .map_err(|e| temporal_error("time", s, path, e))?;
    let seconds =
        i64::from(time.hour()) * 3_600 + i64::from(time.minute()) * 60 + i64::from(time.second());
    Ok(seconds * 1_000_000 + i64::from(time.millisecond()) * 1_000 + i64::from(time.microsecond()))
}

/// An RFC 3339 instant, or a civil datetime taken as UTC
fn parse_timestamp(s: &str, path: &str) -> Result<jiff::Timestamp> {
    if let Ok(ts) = s.parse::<jiff::Timestamp>() {
        return Ok(ts);
    }
    let datetime: jiff::civil::DateTime = s
        .parse()
        .map_err(|e| temporal_error("timestamp", s, path, e))?;
    datetime
        .to_zoned(jiff::tz::TimeZone::UTC)
        .map(|zoned| zoned.timestamp())
        .map_err(|e| temporal_error("timestamp", s, path, e))
}

fn temporal_error(kind: &str, s: &str, path: &str, e: jiff::Error) -> ColumnifyError {
    ColumnifyError::write(format!(
        "column '{}': '{}' is not a valid {}: {}",
        path, s, kind, e
    ))
}

fn mismatch(expected: &str, json: &Json, path: &str) -> ColumnifyError {
    let found = match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    };
    ColumnifyError::write(format!(
        "column '{}': expected {}, got {}",
        path, expected, found
    ))
}
