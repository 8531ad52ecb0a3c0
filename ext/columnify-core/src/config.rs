//! Writer configuration

use crate::{ColumnifyError, Result};
use parquet::basic::Compression;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: usize = 8 * 1024;
pub const DEFAULT_ROW_GROUP_SIZE: u64 = 128 * 1024 * 1024;

/// Configuration for one conversion session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub parquet: ParquetConfig,
}

/// Layout and compression of the Parquet output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParquetConfig {
    /// Target data page size in bytes
    pub page_size: usize,
    /// Buffered bytes at which a row group is closed
    pub row_group_size: u64,
    pub compression_codec: CompressionCodec,
}

impl Default for ParquetConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            compression_codec: CompressionCodec::Snappy,
        }
    }
}

/// Compression codecs, named the way Parquet names them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionCodec {
    Uncompressed,
    Snappy,
    Gzip,
    Lz4,
    Lz4Raw,
    Zstd,
    Brotli,
}

impl CompressionCodec {
    pub const ALL: [CompressionCodec; 7] = [
        CompressionCodec::Uncompressed,
        CompressionCodec::Snappy,
        CompressionCodec::Gzip,
        CompressionCodec::Lz4,
        CompressionCodec::Lz4Raw,
        CompressionCodec::Zstd,
        CompressionCodec::Brotli,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionCodec::Uncompressed => "UNCOMPRESSED",
            CompressionCodec::Snappy => "SNAPPY",
            CompressionCodec::Gzip => "GZIP",
            CompressionCodec::Lz4 => "LZ4",
            CompressionCodec::Lz4Raw => "LZ4_RAW",
            CompressionCodec::Zstd => "ZSTD",
            CompressionCodec::Brotli => "BROTLI",
        }
    }

    /// The codec at its default level
    pub fn to_compression(self) -> Compression {
        match self {
            CompressionCodec::Uncompressed => Compression::UNCOMPRESSED,
            CompressionCodec::Snappy => Compression::SNAPPY,
            CompressionCodec::Gzip => Compression::GZIP(Default::default()),
            CompressionCodec::Lz4 => Compression::LZ4,
            CompressionCodec::Lz4Raw => Compression::LZ4_RAW,
            CompressionCodec::Zstd => Compression::ZSTD(Default::default()),
            CompressionCodec::Brotli => Compression::BROTLI(Default::default()),
        }
    }
}

impl FromStr for CompressionCodec {
    type Err = ColumnifyError;

    fn from_str(s: &str) -> Result<Self> {
        CompressionCodec::ALL
            .into_iter()
            .find(|codec| codec.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ColumnifyError::config(format!("unknown compression codec '{}'", s))
            })
    }
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.parquet.page_size, 8192);
        assert_eq!(config.parquet.row_group_size, 134_217_728);
        assert_eq!(config.parquet.compression_codec, CompressionCodec::Snappy);
    }

    #[test]
    fn test_codec_names() {
        assert_eq!(
            "zstd".parse::<CompressionCodec>().unwrap(),
            CompressionCodec::Zstd
        );
        assert_eq!(
            "Lz4_Raw".parse::<CompressionCodec>().unwrap(),
            CompressionCodec::Lz4Raw
        );
        for codec in CompressionCodec::ALL {
            assert_eq!(codec.to_string().parse::<CompressionCodec>().unwrap(), codec);
        }

        let err = "lzo".parse::<CompressionCodec>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }
}
