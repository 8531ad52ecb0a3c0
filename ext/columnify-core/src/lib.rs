//! Conversion of row-oriented records into Parquet
//!
//! `columnify-core` turns streams of Avro, CSV, TSV, JSON Lines, LTSV or
//! MessagePack records into a single Parquet file described by an Avro or
//! BigQuery schema.
//!
//! # Key Components
//!
//! - **Schema**: [`schema::resolve`] turns a schema file into an
//!   [`IntermediateSchema`], the ordered field list every other stage uses.
//!
//! - **Records**: one [`record::Decoder`] per [`RecordType`] yields
//!   [`record::CanonicalRecord`]s; [`record::JsonStringConverter`] encodes
//!   them into [`record::TransportValue`]s.
//!
//! - **Writer**: [`Writer`] coerces transport values against the schema,
//!   buffers rows and writes them through the parquet crate's `ArrowWriter`.
//!   Compression, page size and row-group size come from [`Config`].
//!
//! - **Session**: [`Columnifier`] drives one or more inputs into one output
//!   and finalizes it exactly once.

pub mod arrow_conversion;
pub mod columnifier;
pub mod config;
pub mod error;
pub mod marshal;
pub mod output;
pub mod record;
pub mod schema;
pub mod traits;
pub mod value;
pub mod writer;

pub use columnifier::{Columnifier, SessionState};
pub use config::{CompressionCodec, Config, ParquetConfig};
pub use error::{ColumnifyError, ErrorContext, ErrorKind, Position, Result};
pub use output::OutputSink;
pub use record::{RecordType, TransportValue};
pub use schema::{
    IntermediateSchema, PrimitiveType, Repetition, SchemaBuilder, SchemaNode, SchemaType,
};
pub use traits::RecordSink;
pub use value::ParquetValue;
pub use writer::{Writer, WriterBuilder};
