//! Conversion from column vectors of [`ParquetValue`] into Arrow arrays
//!
//! The writer buffers rows, transposes them into columns, and hands each
//! column to [`parquet_values_to_arrow_array`] together with the Arrow field
//! derived from the schema. Nested columns recurse through their children.

use crate::{ColumnifyError, ParquetValue, Result};
use arrow_array::{builder::*, ArrayRef, ListArray, MapArray, StructArray};
use arrow_schema::{DataType, Field, TimeUnit};
use std::sync::Arc;

/// Convert a vector of ParquetValues to an Arrow array
pub fn parquet_values_to_arrow_array(values: Vec<ParquetValue>, field: &Field) -> Result<ArrayRef> {
    match field.data_type() {
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(values.len());
            for value in values {
                match value {
                    ParquetValue::Boolean(b) => builder.append_value(b),
                    ParquetValue::Null => builder.append_null(),
                    other => return Err(mismatch("Boolean", &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }

        DataType::Int32 => build_int32_array(values),
        DataType::Int64 => build_int64_array(values),
        DataType::Float32 => build_float32_array(values),
        DataType::Float64 => build_float64_array(values),

        DataType::Utf8 => build_string_array(values),
        DataType::Binary => build_binary_array(values),

        DataType::Date32 => build_date32_array(values),
        DataType::Time32(TimeUnit::Millisecond) => build_time32_array(values),
        DataType::Time64(TimeUnit::Microsecond) => build_time64_array(values),
        DataType::Timestamp(unit, tz) => build_timestamp_array(values, unit, tz.clone()),

        DataType::List(item_field) => build_list_array(values, item_field),
        DataType::Map(entries_field, _) => build_map_array(values, entries_field),
        DataType::Struct(fields) => build_struct_array(values, fields),

        dt => Err(ColumnifyError::write(format!(
            "unsupported column type {:?} for field '{}'",
            dt,
            field.name()
        ))),
    }
}

fn mismatch(expected: &str, value: &ParquetValue) -> ColumnifyError {
    ColumnifyError::write(format!(
        "expected {}, got {}",
        expected,
        value.type_name()
    ))
}

/// Build Int32 array
fn build_int32_array(values: Vec<ParquetValue>) -> Result<ArrayRef> {
    let mut builder = Int32Builder::with_capacity(values.len());
    for value in values {
        match value {
            ParquetValue::Int32(i) => builder.append_value(i),
            ParquetValue::Null => builder.append_null(),
            other => return Err(mismatch("Int32", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build Int64 array, widening Int32
fn build_int64_array(values: Vec<ParquetValue>) -> Result<ArrayRef> {
    let mut builder = Int64Builder::with_capacity(values.len());
    for value in values {
        match value {
            ParquetValue::Int64(i) => builder.append_value(i),
            ParquetValue::Int32(i) => builder.append_value(i64::from(i)),
            ParquetValue::Null => builder.append_null(),
            other => return Err(mismatch("Int64", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn build_float32_array(values: Vec<ParquetValue>) -> Result<ArrayRef> {
    let mut builder = Float32Builder::with_capacity(values.len());
    for value in values {
        match value {
            ParquetValue::Float32(f) => builder.append_value(f.into_inner()),
            ParquetValue::Null => builder.append_null(),
            other => return Err(mismatch("Float32", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build Float64 array with Float32 support
fn build_float64_array(values: Vec<ParquetValue>) -> Result<ArrayRef> {
    let mut builder = Float64Builder::with_capacity(values.len());
    for value in values {
        match value {
            ParquetValue::Float64(f) => builder.append_value(f.into_inner()),
            ParquetValue::Float32(f) => builder.append_value(f64::from(f.into_inner())),
            ParquetValue::Null => builder.append_null(),
            other => return Err(mismatch("Float64", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn build_string_array(values: Vec<ParquetValue>) -> Result<ArrayRef> {
    let mut builder = StringBuilder::with_capacity(values.len(), 0);
    for value in values {
        match value {
            ParquetValue::String(s) => builder.append_value(&s),
            ParquetValue::Null => builder.append_null(),
            other => return Err(mismatch("String", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn build_binary_array(values: Vec<ParquetValue>) -> Result<ArrayRef> {
    let mut builder = BinaryBuilder::with_capacity(values.len(), 0);
    for value in values {
        match value {
            ParquetValue::Bytes(b) => builder.append_value(&b),
            ParquetValue::Null => builder.append_null(),
            other => return Err(mismatch("Bytes", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn build_date32_array(values: Vec<ParquetValue>) -> Result<ArrayRef> {
    let mut builder = Date32Builder::with_capacity(values.len());
    for value in values {
        match value {
            ParquetValue::Date32(d) => builder.append_value(d),
            ParquetValue::Null => builder.append_null(),
            other => return Err(mismatch("Date32", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn build_time32_array(values: Vec<ParquetValue>) -> Result<ArrayRef> {
    let mut builder = Time32MillisecondBuilder::with_capacity(values.len());
    for value in values {
        match value {
            ParquetValue::TimeMillis(t) => builder.append_value(t),
            ParquetValue::Null => builder.append_null(),
            other => return Err(mismatch("TimeMillis", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn build_time64_array(values: Vec<ParquetValue>) -> Result<ArrayRef> {
    let mut builder = Time64MicrosecondBuilder::with_capacity(values.len());
    for value in values {
        match value {
            ParquetValue::TimeMicros(t) => builder.append_value(t),
            ParquetValue::Null => builder.append_null(),
            other => return Err(mismatch("TimeMicros", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build timestamp array
fn build_timestamp_array(
    values: Vec<ParquetValue>,
    unit: &TimeUnit,
    tz: Option<Arc<str>>,
) -> Result<ArrayRef> {
    match unit {
        TimeUnit::Millisecond => {
            let mut builder =
                TimestampMillisecondBuilder::with_capacity(values.len()).with_timezone_opt(tz);
            for value in values {
                match value {
                    ParquetValue::TimestampMillis(t) => builder.append_value(t),
                    ParquetValue::Null => builder.append_null(),
                    other => return Err(mismatch("TimestampMillis", &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        TimeUnit::Microsecond => {
            let mut builder =
                TimestampMicrosecondBuilder::with_capacity(values.len()).with_timezone_opt(tz);
            for value in values {
                match value {
                    ParquetValue::TimestampMicros(t) => builder.append_value(t),
                    ParquetValue::Null => builder.append_null(),
                    other => return Err(mismatch("TimestampMicros", &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        other => Err(ColumnifyError::write(format!(
            "unsupported timestamp unit {:?}",
            other
        ))),
    }
}

/// Build list array
fn build_list_array(values: Vec<ParquetValue>, item_field: &Arc<Field>) -> Result<ArrayRef> {
    let mut all_items = Vec::new();
    let mut offsets = Vec::with_capacity(values.len() + 1);
    let mut null_buffer_builder = arrow_buffer::BooleanBufferBuilder::new(values.len());
    offsets.push(0i32);

    for value in values {
        match value {
            ParquetValue::List(items) => {
                all_items.extend(items);
                offsets.push(offset(all_items.len())?);
                null_buffer_builder.append(true);
            }
            ParquetValue::Null => {
                offsets.push(offset(all_items.len())?);
                null_buffer_builder.append(false);
            }
            other => return Err(mismatch("List", &other)),
        }
    }

    let item_array = parquet_values_to_arrow_array(all_items, item_field)?;
    let offset_buffer = arrow_buffer::OffsetBuffer::new(offsets.into());
    let null_buffer = null_buffer_builder.finish();

    Ok(Arc::new(ListArray::try_new(
        item_field.clone(),
        offset_buffer,
        item_array,
        Some(null_buffer.into()),
    )?))
}

/// Build map array
fn build_map_array(values: Vec<ParquetValue>, entries_field: &Arc<Field>) -> Result<ArrayRef> {
    let struct_fields = match entries_field.data_type() {
        DataType::Struct(fields) if fields.len() == 2 => fields.clone(),
        _ => {
            return Err(ColumnifyError::internal(
                "map entries field must be a struct with exactly 2 fields",
            ))
        }
    };

    let mut all_keys = Vec::new();
    let mut all_values = Vec::new();
    let mut offsets = Vec::with_capacity(values.len() + 1);
    let mut null_buffer_builder = arrow_buffer::BooleanBufferBuilder::new(values.len());
    offsets.push(0i32);

    for value in values {
        match value {
            ParquetValue::Map(entries) => {
                for (k, v) in entries {
                    all_keys.push(k);
                    all_values.push(v);
                }
                offsets.push(offset(all_keys.len())?);
                null_buffer_builder.append(true);
            }
            ParquetValue::Null => {
                offsets.push(offset(all_keys.len())?);
                null_buffer_builder.append(false);
            }
            other => return Err(mismatch("Map", &other)),
        }
    }

    let key_array = parquet_values_to_arrow_array(all_keys, &struct_fields[0])?;
    let value_array = parquet_values_to_arrow_array(all_values, &struct_fields[1])?;
    let struct_array = StructArray::try_new(struct_fields, vec![key_array, value_array], None)?;

    let offset_buffer = arrow_buffer::OffsetBuffer::new(offsets.into());
    let null_buffer = null_buffer_builder.finish();

    Ok(Arc::new(MapArray::try_new(
        entries_field.clone(),
        offset_buffer,
        struct_array,
        Some(null_buffer.into()),
        false,
    )?))
}

/// Build struct array
fn build_struct_array(
    values: Vec<ParquetValue>,
    fields: &arrow_schema::Fields,
) -> Result<ArrayRef> {
    let num_rows = values.len();
    let mut null_buffer_builder = arrow_buffer::BooleanBufferBuilder::new(num_rows);

    let mut field_columns: Vec<Vec<ParquetValue>> =
        vec![Vec::with_capacity(num_rows); fields.len()];

    for value in values {
        match value {
            ParquetValue::Record(mut map) => {
                null_buffer_builder.append(true);
                for (idx, field) in fields.iter().enumerate() {
                    let field_value = map
                        .swap_remove(field.name().as_str())
                        .unwrap_or(ParquetValue::Null);
                    field_columns[idx].push(field_value);
                }
            }
            ParquetValue::Null => {
                null_buffer_builder.append(false);
                for field_column in field_columns.iter_mut() {
                    field_column.push(ParquetValue::Null);
                }
            }
            other => return Err(mismatch("Record", &other)),
        }
    }

    let field_arrays = field_columns
        .into_iter()
        .zip(fields.iter())
        .map(|(column, field)| parquet_values_to_arrow_array(column, field))
        .collect::<Result<Vec<_>>>()?;

    let null_buffer = null_buffer_builder.finish();
    Ok(Arc::new(StructArray::try_new(
        fields.clone(),
        field_arrays,
        Some(null_buffer.into()),
    )?))
}

fn offset(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| ColumnifyError::write("nested column exceeds i32 offsets in one batch"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{Array, Int64Array, StringArray};
    use indexmap::IndexMap;
    use ordered_float::OrderedFloat;

    #[test]
    fn test_primitive_columns() {
        let field = Field::new("n", DataType::Int64, true);
        let array = parquet_values_to_arrow_array(
            vec![
                ParquetValue::Int64(1),
                ParquetValue::Null,
                ParquetValue::Int32(3),
            ],
            &field,
        )
        .unwrap();

        let ints = array.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ints.len(), 3);
        assert_eq!(ints.value(0), 1);
        assert!(ints.is_null(1));
        assert_eq!(ints.value(2), 3);

        let field = Field::new("f", DataType::Float64, false);
        let array = parquet_values_to_arrow_array(
            vec![ParquetValue::Float32(OrderedFloat(1.5))],
            &field,
        )
        .unwrap();
        assert_eq!(array.len(), 1);
    }

    #[test]
    fn test_type_mismatch() {
        let field = Field::new("s", DataType::Utf8, false);
        let err = parquet_values_to_arrow_array(vec![ParquetValue::Int64(1)], &field).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Write);
    }

    #[test]
    fn test_nested_columns() {
        let item = Arc::new(Field::new("item", DataType::Utf8, true));
        let field = Field::new("tags", DataType::List(item), true);
        let array = parquet_values_to_arrow_array(
            vec![
                ParquetValue::List(vec![ParquetValue::String(Arc::from("a"))]),
                ParquetValue::Null,
            ],
            &field,
        )
        .unwrap();
        assert_eq!(array.len(), 2);
        assert!(array.is_null(1));

        let fields = arrow_schema::Fields::from(vec![
            Field::new("x", DataType::Int64, false),
            Field::new("label", DataType::Utf8, true),
        ]);
        let field = Field::new("point", DataType::Struct(fields), true);
        let mut record = IndexMap::new();
        record.insert(Arc::from("x"), ParquetValue::Int64(4));
        let array = parquet_values_to_arrow_array(
            vec![ParquetValue::Record(record), ParquetValue::Null],
            &field,
        )
        .unwrap();
        let structs = array.as_any().downcast_ref::<StructArray>().unwrap();
        let labels = structs
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(labels.is_null(0));
        assert!(structs.is_null(1));
    }
}
