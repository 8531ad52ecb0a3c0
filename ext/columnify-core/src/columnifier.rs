//! Conversion sessions
//!
//! A [`Columnifier`] owns one resolved schema, one record type and one sink.
//! Inputs are converted one after another into the same sink, and the sink
//! is finalized at most once. The first error moves the session into a
//! failed state from which no further writes are accepted.

use crate::config::Config;
use crate::output::OutputSink;
use crate::record::{JsonStringConverter, RecordType};
use crate::schema::{self, IntermediateSchema, SchemaType};
use crate::traits::RecordSink;
use crate::writer::{Writer, WriterBuilder};
use crate::{ColumnifyError, ErrorContext, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Source name attached to errors from unnamed streams
pub const STREAM_SOURCE: &str = "<stream>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Writing,
    Failed,
    Finalized,
}

/// One conversion run into one output
pub struct Columnifier<S: RecordSink> {
    schema: IntermediateSchema,
    record_type: RecordType,
    sink: Option<S>,
    state: SessionState,
}

impl Columnifier<Writer<OutputSink>> {
    /// Open a session writing Parquet to `output`, or to standard output
    ///
    /// Both tags are checked before anything is read or created, then the
    /// schema file is resolved, and only then is the output opened.
    pub fn new<P: AsRef<Path>>(
        schema_type: &str,
        schema_file: P,
        record_type: &str,
        output: Option<&Path>,
        config: &Config,
    ) -> Result<Self> {
        let record_type: RecordType = record_type.parse()?;
        let schema_type: SchemaType = schema_type.parse()?;

        let schema_file = schema_file.as_ref();
        let content = std::fs::read(schema_file)
            .with_context(|| format!("failed to read schema file {}", schema_file.display()))?;
        let schema = schema::resolve(&content, schema_type)
            .with_context(|| format!("invalid schema file {}", schema_file.display()))?;

        let sink = OutputSink::open(output)?;
        let writer = WriterBuilder::from_config(&config.parquet).build(sink, schema.clone())?;

        tracing::info!(
            schema_type = %schema_type,
            record_type = %record_type,
            codec = %config.parquet.compression_codec,
            "conversion session opened"
        );

        Ok(Self::with_sink(schema, record_type, writer))
    }
}

impl<S: RecordSink> Columnifier<S> {
    /// Session over an already opened sink
    pub fn with_sink(schema: IntermediateSchema, record_type: RecordType, sink: S) -> Self {
        Self {
            schema,
            record_type,
            sink: Some(sink),
            state: SessionState::Writing,
        }
    }

    pub fn schema(&self) -> &IntermediateSchema {
        &self.schema
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Convert every record of one stream
    ///
    /// Returns the growth of the sink's byte count caused by this stream.
    /// Errors are attributed to `<stream>`.
    pub fn write_from_reader<R: Read>(&mut self, reader: R) -> Result<u64> {
        self.ensure_writing()?;
        let result = self.convert_stream(reader).context(STREAM_SOURCE);
        if result.is_err() {
            self.state = SessionState::Failed;
        }
        result
    }

    /// Convert files in order, stopping at the first failure
    ///
    /// Returns the total bytes written for all files. Errors name the file
    /// they came from.
    pub fn write_from_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<u64> {
        let mut total = 0;
        for path in paths {
            self.ensure_writing()?;
            let path = path.as_ref();

            let result = File::open(path)
                .map_err(ColumnifyError::from)
                .and_then(|file| self.convert_stream(file))
                .with_context(|| format!("{}", path.display()));

            match result {
                Ok(bytes) => {
                    tracing::debug!(path = %path.display(), bytes, "converted input file");
                    total += bytes;
                }
                Err(e) => {
                    self.state = SessionState::Failed;
                    return Err(e);
                }
            }
        }
        Ok(total)
    }

    fn convert_stream<R: Read>(&mut self, reader: R) -> Result<u64> {
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| ColumnifyError::internal("session has no open sink"))?;
        let mut converter = JsonStringConverter::new(reader, &self.schema, self.record_type);

        let before = sink.size();
        while let Some(value) = converter.convert()? {
            sink.write(&value)
                .with_context(|| format!("record {}", converter.converted()))?;
        }
        Ok(sink.size() - before)
    }

    fn ensure_writing(&self) -> Result<()> {
        match self.state {
            SessionState::Writing => Ok(()),
            SessionState::Failed => Err(ColumnifyError::internal(
                "session has failed and accepts no more input",
            )),
            SessionState::Finalized => {
                Err(ColumnifyError::internal("session is already finalized"))
            }
        }
    }

    /// Finish the output
    ///
    /// A failed session drops its sink without writing trailing metadata.
    /// Calling this twice is an error.
    pub fn finalize(&mut self) -> Result<()> {
        let sink = self
            .sink
            .take()
            .ok_or_else(|| ColumnifyError::internal("session is already finalized"))?;

        match self.state {
            SessionState::Failed => {
                drop(sink);
                tracing::warn!("conversion failed; output left unfinalized");
                Ok(())
            }
            _ => {
                self.state = SessionState::Finalized;
                sink.finalize()?;
                tracing::info!("conversion session finalized");
                Ok(())
            }
        }
    }
}
