//! Core Parquet writing functionality

use crate::config::ParquetConfig;
use crate::marshal::marshal_row;
use crate::record::TransportValue;
use crate::traits::RecordSink;
use crate::{
    arrow_conversion::parquet_values_to_arrow_array, ColumnifyError, IntermediateSchema,
    ParquetValue, PrimitiveType, Result, SchemaNode,
};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, SchemaRef, TimeUnit};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::io::Write;
use std::sync::Arc;

const DEFAULT_BATCH_SIZE: usize = 1000;

/// Builder for creating a configured Writer
pub struct WriterBuilder {
    compression: Compression,
    page_size: usize,
    row_group_size: u64,
    batch_size: usize,
}

impl Default for WriterBuilder {
    fn default() -> Self {
        Self::from_config(&ParquetConfig::default())
    }
}

impl WriterBuilder {
    /// Create a new WriterBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ParquetConfig) -> Self {
        Self {
            compression: config.compression_codec.to_compression(),
            page_size: config.page_size,
            row_group_size: config.row_group_size,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the compression algorithm
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the data page size limit in bytes
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the buffered size in bytes at which a row group is closed
    pub fn with_row_group_size(mut self, size: u64) -> Self {
        self.row_group_size = size;
        self
    }

    /// Set how many rows are buffered before they become a record batch
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Build a Writer with the configured settings
    pub fn build<W: Write + Send>(self, writer: W, schema: IntermediateSchema) -> Result<Writer<W>> {
        let arrow_schema = schema_to_arrow(&schema)?;

        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_data_page_size_limit(self.page_size)
            .build();

        let arrow_writer = ArrowWriter::try_new(writer, arrow_schema.clone(), Some(props))?;

        Ok(Writer {
            arrow_writer: Some(arrow_writer),
            arrow_schema,
            schema,
            buffered_rows: Vec::new(),
            batch_size: self.batch_size,
            row_group_size: self.row_group_size,
            rows_written: 0,
            logical_size: 0,
        })
    }
}

/// Parquet writer over any `Write + Send` output
///
/// Rows are buffered, transposed into Arrow arrays in batches, and handed to
/// an [`ArrowWriter`]. The footer is only written by [`Writer::close`];
/// dropping a writer leaves the output unfinished.
pub struct Writer<W: Write + Send> {
    arrow_writer: Option<ArrowWriter<W>>,
    arrow_schema: SchemaRef,
    schema: IntermediateSchema,
    buffered_rows: Vec<Vec<ParquetValue>>,
    batch_size: usize,
    row_group_size: u64,
    rows_written: u64,
    logical_size: u64,
}

impl<W> Writer<W>
where
    W: Write + Send,
{
    /// Create a new writer with default settings
    pub fn new(writer: W, schema: IntermediateSchema) -> Result<Self> {
        WriterBuilder::new().build(writer, schema)
    }

    pub fn schema(&self) -> &IntermediateSchema {
        &self.schema
    }

    /// Coerce a transport value against the schema and write it as one row
    pub fn write_value(&mut self, value: &TransportValue) -> Result<()> {
        let row = marshal_row(&self.schema, value)?;
        self.write_row(row)
    }

    /// Write a single row
    ///
    /// Each row holds one value per schema field, in schema order. Rows are
    /// buffered internally and written in batches.
    pub fn write_row(&mut self, row: Vec<ParquetValue>) -> Result<()> {
        let num_cols = self.arrow_schema.fields().len();
        if row.len() != num_cols {
            return Err(ColumnifyError::write(format!(
                "row has {} values but schema has {} fields",
                row.len(),
                num_cols
            )));
        }

        self.logical_size += row.iter().map(ParquetValue::encoded_size).sum::<u64>();
        self.rows_written += 1;
        self.buffered_rows.push(row);

        if self.buffered_rows.len() >= self.batch_size {
            self.flush_buffered_rows()?;
        }

        Ok(())
    }

    /// Rows accepted so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Logical plain-encoded size of all accepted rows
    pub fn logical_size(&self) -> u64 {
        self.logical_size
    }

    /// Bytes the underlying Parquet writer has emitted so far
    pub fn bytes_flushed(&self) -> u64 {
        self.arrow_writer
            .as_ref()
            .map(|w| w.bytes_written() as u64)
            .unwrap_or(0)
    }

    /// Flush buffered rows to the Parquet file
    fn flush_buffered_rows(&mut self) -> Result<()> {
        if self.buffered_rows.is_empty() {
            return Ok(());
        }

        let rows = std::mem::take(&mut self.buffered_rows);
        let num_rows = rows.len();

        // Transpose rows to columns
        let num_cols = self.arrow_schema.fields().len();
        let mut columns: Vec<Vec<ParquetValue>> = vec![Vec::with_capacity(num_rows); num_cols];
        for row in rows {
            for (col_idx, value) in row.into_iter().enumerate() {
                columns[col_idx].push(value);
            }
        }

        let arrow_columns = columns
            .into_iter()
            .zip(self.arrow_schema.fields())
            .map(|(values, field)| parquet_values_to_arrow_array(values, field))
            .collect::<Result<Vec<_>>>()?;

        let batch = RecordBatch::try_new(self.arrow_schema.clone(), arrow_columns)?;

        let writer = self
            .arrow_writer
            .as_mut()
            .ok_or_else(|| ColumnifyError::internal("writer has been closed"))?;
        writer.write(&batch)?;

        if writer.in_progress_size() as u64 >= self.row_group_size {
            tracing::debug!(
                rows = writer.in_progress_rows(),
                bytes = writer.in_progress_size(),
                "closing row group"
            );
            writer.flush()?;
        }

        Ok(())
    }

    /// Close the writer and write the file footer
    ///
    /// Returns the underlying output, already flushed.
    pub fn close(mut self) -> Result<W> {
        self.flush_buffered_rows()?;

        let writer = self
            .arrow_writer
            .take()
            .ok_or_else(|| ColumnifyError::internal("writer has been closed"))?;
        let mut inner = writer.into_inner()?;
        inner.flush()?;

        tracing::debug!(
            rows = self.rows_written,
            logical_bytes = self.logical_size,
            "parquet footer written"
        );
        Ok(inner)
    }
}

impl<W: Write + Send> RecordSink for Writer<W> {
    fn write(&mut self, value: &TransportValue) -> Result<()> {
        self.write_value(value)
    }

    fn size(&self) -> u64 {
        self.logical_size
    }

    fn finalize(self) -> Result<()> {
        self.close()
            .map(|_| ())
            .map_err(|e| ColumnifyError::finalize(e.to_string()))
    }
}

/// Convert the intermediate schema to an Arrow schema
pub fn schema_to_arrow(schema: &IntermediateSchema) -> Result<SchemaRef> {
    let arrow_fields = schema
        .fields()
        .iter()
        .map(schema_node_to_arrow_field)
        .collect::<Result<Vec<_>>>()?;

    Ok(Arc::new(arrow_schema::Schema::new(arrow_fields)))
}

/// Convert a SchemaNode to an Arrow Field
fn schema_node_to_arrow_field(node: &SchemaNode) -> Result<Field> {
    match node {
        SchemaNode::Primitive {
            name,
            primitive_type,
            nullable,
        } => Ok(Field::new(name, primitive_type_to_arrow(*primitive_type), *nullable)),
        SchemaNode::List {
            name,
            item,
            nullable,
        } => {
            let item_field = schema_node_to_arrow_field(item)?;
            let list_type = DataType::List(Arc::new(Field::new(
                "item",
                item_field.data_type().clone(),
                item.is_nullable(),
            )));
            Ok(Field::new(name, list_type, *nullable))
        }
        SchemaNode::Map {
            name,
            value,
            nullable,
        } => {
            let value_field = schema_node_to_arrow_field(value)?;

            let struct_fields = vec![
                Field::new("key", DataType::Utf8, false),
                Field::new("value", value_field.data_type().clone(), value.is_nullable()),
            ];

            let map_type = DataType::Map(
                Arc::new(Field::new(
                    "entries",
                    DataType::Struct(struct_fields.into()),
                    false,
                )),
                false, // keys_sorted
            );

            Ok(Field::new(name, map_type, *nullable))
        }
        SchemaNode::Struct {
            name,
            fields,
            nullable,
        } => {
            let struct_fields = fields
                .iter()
                .map(schema_node_to_arrow_field)
                .collect::<Result<Vec<_>>>()?;

            Ok(Field::new(name, DataType::Struct(struct_fields.into()), *nullable))
        }
    }
}

/// Convert PrimitiveType to Arrow DataType
///
/// Timestamps carry a UTC zone so they are stored as adjusted to UTC.
fn primitive_type_to_arrow(ptype: PrimitiveType) -> DataType {
    match ptype {
        PrimitiveType::Boolean => DataType::Boolean,
        PrimitiveType::Int32 => DataType::Int32,
        PrimitiveType::Int64 => DataType::Int64,
        PrimitiveType::Float32 => DataType::Float32,
        PrimitiveType::Float64 => DataType::Float64,
        PrimitiveType::String => DataType::Utf8,
        PrimitiveType::Binary => DataType::Binary,
        PrimitiveType::Date32 => DataType::Date32,
        PrimitiveType::TimeMillis => DataType::Time32(TimeUnit::Millisecond),
        PrimitiveType::TimeMicros => DataType::Time64(TimeUnit::Microsecond),
        PrimitiveType::TimestampMillis => {
            DataType::Timestamp(TimeUnit::Millisecond, Some(Arc::from("UTC")))
        }
        PrimitiveType::TimestampMicros => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(Arc::from("UTC")))
        }
    }
}
