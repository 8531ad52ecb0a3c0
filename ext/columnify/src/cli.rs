use std::io;
use std::path::PathBuf;

use clap::Parser;
use columnify_core::config::{DEFAULT_PAGE_SIZE, DEFAULT_ROW_GROUP_SIZE};
use columnify_core::{ColumnifyError, Columnifier, CompressionCodec, Config, ParquetConfig};
use thiserror::Error;

use crate::logger::LogLevel;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Columnify(#[from] ColumnifyError),

    #[error("conversion failed: {0}")]
    Conversion(ColumnifyError),
}

/// Convert row-oriented records into a Parquet file
#[derive(Parser, Debug)]
#[command(name = "columnify", version, about)]
pub struct Cli {
    /// Schema language of --schema-file (avro, bigquery)
    #[arg(long, env = "COLUMNIFY_SCHEMA_TYPE")]
    pub schema_type: String,

    /// Path to the schema file
    #[arg(long, env = "COLUMNIFY_SCHEMA_FILE")]
    pub schema_file: PathBuf,

    /// Input record format (avro, csv, jsonl, ltsv, msgpack, tsv)
    #[arg(long, env = "COLUMNIFY_RECORD_TYPE")]
    pub record_type: String,

    /// Output file; standard output when omitted
    #[arg(short, long, env = "COLUMNIFY_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Parquet data page size in bytes
    #[arg(long, env = "COLUMNIFY_PARQUET_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub parquet_page_size: usize,

    /// Parquet row group size in bytes
    #[arg(long, env = "COLUMNIFY_PARQUET_ROW_GROUP_SIZE", default_value_t = DEFAULT_ROW_GROUP_SIZE)]
    pub parquet_row_group_size: u64,

    /// Parquet compression codec
    #[arg(long, env = "COLUMNIFY_PARQUET_COMPRESSION_CODEC", default_value = "SNAPPY")]
    pub parquet_compression_codec: CompressionCodec,

    /// Diagnostic verbosity
    #[arg(long, env = "COLUMNIFY_LOG_LEVEL", default_value = "warn")]
    pub log_level: LogLevel,

    /// Input files; standard input when none are given
    pub files: Vec<PathBuf>,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            parquet: ParquetConfig {
                page_size: self.parquet_page_size,
                row_group_size: self.parquet_row_group_size,
                compression_codec: self.parquet_compression_codec,
            },
        }
    }

    /// Run one conversion session; returns the bytes written
    pub fn run(&self) -> Result<u64, CliError> {
        let mut session = Columnifier::new(
            &self.schema_type,
            &self.schema_file,
            &self.record_type,
            self.output.as_deref(),
            &self.config(),
        )?;

        let written = if self.files.is_empty() {
            session.write_from_reader(io::stdin().lock())
        } else {
            session.write_from_files(&self.files)
        };

        match written {
            Ok(bytes) => {
                session.finalize()?;
                tracing::info!(bytes, "conversion complete");
                Ok(bytes)
            }
            Err(e) => {
                session.finalize()?;
                Err(CliError::Conversion(e))
            }
        }
    }
}
