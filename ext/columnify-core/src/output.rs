use crate::{ErrorContext, Result};
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

/// Where the Parquet bytes go
pub enum OutputSink {
    File(BufWriter<File>),
    Stdout(BufWriter<Stdout>),
}

impl OutputSink {
    /// Create (or truncate) the named file, or use standard output without a path
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create output {}", path.display()))?;
                tracing::debug!(path = %path.display(), "opened output file");
                Ok(OutputSink::File(BufWriter::new(file)))
            }
            None => {
                tracing::debug!("writing to standard output");
                Ok(OutputSink::Stdout(BufWriter::new(io::stdout())))
            }
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::File(w) => w.write(buf),
            OutputSink::Stdout(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::File(w) => w.flush(),
            OutputSink::Stdout(w) => w.flush(),
        }
    }
}
