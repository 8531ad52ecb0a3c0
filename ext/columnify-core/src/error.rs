use std::fmt;

use thiserror::Error;

/// Where in an input stream a record was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based index of the record within its input
    pub record: u64,
    /// 1-based line number, for line-oriented formats
    pub line: Option<u64>,
    /// Byte offset of the start of the record
    pub byte: Option<u64>,
}

impl Position {
    pub fn record(record: u64) -> Self {
        Self {
            record,
            ..Self::default()
        }
    }

    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_byte(mut self, byte: u64) -> Self {
        self.byte = Some(byte);
        self
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {}", self.record)?;
        match (self.line, self.byte) {
            (Some(line), Some(byte)) => write!(f, " (line {}, byte {})", line, byte),
            (Some(line), None) => write!(f, " (line {})", line),
            (None, Some(byte)) => write!(f, " (byte {})", byte),
            (None, None) => Ok(()),
        }
    }
}

/// Core error type for conversions
#[derive(Error, Debug)]
pub enum ColumnifyError {
    /// IO errors from file and stream operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow errors raised while assembling record batches
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Parquet format errors
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Malformed or unsupported schema source
    #[error("Schema error: {0}")]
    Schema(String),

    /// Unknown record-type tag
    #[error("Unsupported record type: {0}")]
    UnsupportedRecord(String),

    /// Malformed input record
    #[error("Decode error at {position}: {message}")]
    Decode { position: Position, message: String },

    /// Decoded record that has no lossless transport form
    #[error("Unconvertible record: {0}")]
    UnconvertibleRecord(String),

    /// The columnar writer rejected a row
    #[error("Write error: {0}")]
    Write(String),

    /// The columnar writer failed to finish the output
    #[error("Finalize error: {0}")]
    Finalize(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// Session misuse and invariants that shouldn't break
    #[error("Internal error: {0}")]
    Internal(String),

    /// Another error annotated with where it happened
    #[error("{context}: {inner}")]
    Context {
        context: String,
        #[source]
        inner: Box<ColumnifyError>,
    },
}

/// Coarse classification of a [`ColumnifyError`], looking through context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Schema,
    UnsupportedRecord,
    Decode,
    UnconvertibleRecord,
    Write,
    Finalize,
    Config,
    Internal,
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ColumnifyError>;

impl ColumnifyError {
    /// Create a new schema error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        ColumnifyError::Schema(msg.into())
    }

    /// Create a new unsupported record type error
    pub fn unsupported_record<S: Into<String>>(tag: S) -> Self {
        ColumnifyError::UnsupportedRecord(tag.into())
    }

    /// Create a new decode error at the given position
    pub fn decode<S: Into<String>>(position: Position, msg: S) -> Self {
        ColumnifyError::Decode {
            position,
            message: msg.into(),
        }
    }

    /// Create a new unconvertible record error
    pub fn unconvertible<S: Into<String>>(msg: S) -> Self {
        ColumnifyError::UnconvertibleRecord(msg.into())
    }

    /// Create a new write error
    pub fn write<S: Into<String>>(msg: S) -> Self {
        ColumnifyError::Write(msg.into())
    }

    /// Create a new finalize error
    pub fn finalize<S: Into<String>>(msg: S) -> Self {
        ColumnifyError::Finalize(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ColumnifyError::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        ColumnifyError::Internal(msg.into())
    }

    /// Classify this error, ignoring any context wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            ColumnifyError::Io(_) => ErrorKind::Io,
            ColumnifyError::Arrow(_) | ColumnifyError::Parquet(_) => ErrorKind::Write,
            ColumnifyError::Schema(_) => ErrorKind::Schema,
            ColumnifyError::UnsupportedRecord(_) => ErrorKind::UnsupportedRecord,
            ColumnifyError::Decode { .. } => ErrorKind::Decode,
            ColumnifyError::UnconvertibleRecord(_) => ErrorKind::UnconvertibleRecord,
            ColumnifyError::Write(_) => ErrorKind::Write,
            ColumnifyError::Finalize(_) => ErrorKind::Finalize,
            ColumnifyError::Config(_) => ErrorKind::Config,
            ColumnifyError::Internal(_) => ErrorKind::Internal,
            ColumnifyError::Context { inner, .. } => inner.kind(),
        }
    }

    /// Position of the failing record, if this is a decode error
    pub fn position(&self) -> Option<Position> {
        match self {
            ColumnifyError::Decode { position, .. } => Some(*position),
            ColumnifyError::Context { inner, .. } => inner.position(),
            _ => None,
        }
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ColumnifyError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> Result<T> {
        self.map_err(|e| ColumnifyError::Context {
            context: ctx.into(),
            inner: Box::new(e.into()),
        })
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> Result<T> {
        self.map_err(|e| ColumnifyError::Context {
            context: f().into(),
            inner: Box::new(e.into()),
        })
    }
}
