#![allow(dead_code)]

use columnify_core::*;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Row;
use std::cell::Cell;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// BigQuery schema with an integer id and a nullable name
pub const ID_NAME_BIGQUERY: &str = r#"[
    {"name": "id", "type": "INTEGER", "mode": "REQUIRED"},
    {"name": "name", "type": "STRING"}
]"#;

/// Avro schema covering nested and logical types
pub const EVENT_AVRO: &str = r#"{
    "type": "record",
    "name": "event",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "kind", "type": {"type": "enum", "name": "Kind", "symbols": ["click", "view"]}},
        {"name": "score", "type": ["null", "double"]},
        {"name": "tags", "type": {"type": "array", "items": "string"}},
        {"name": "attrs", "type": ["null", {"type": "map", "values": "long"}]},
        {"name": "at", "type": {"type": "long", "logicalType": "timestamp-millis"}},
        {"name": "payload", "type": ["null", "bytes"]},
        {"name": "origin", "type": ["null", {
            "type": "record",
            "name": "Origin",
            "fields": [
                {"name": "host", "type": "string"},
                {"name": "port", "type": "int"}
            ]
        }]}
    ]
}"#;

/// Scratch directory holding a schema file and inputs for one test
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn file(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Open a session writing `out.parquet` in this workspace
    pub fn session(
        &self,
        schema_type: &str,
        schema: &str,
        record_type: &str,
    ) -> Result<Columnifier<Writer<OutputSink>>> {
        self.session_with_config(schema_type, schema, record_type, &Config::default())
    }

    pub fn session_with_config(
        &self,
        schema_type: &str,
        schema: &str,
        record_type: &str,
        config: &Config,
    ) -> Result<Columnifier<Writer<OutputSink>>> {
        let schema_file = self.file("schema", schema);
        let output = self.path("out.parquet");
        Columnifier::new(schema_type, schema_file, record_type, Some(output.as_path()), config)
    }

    pub fn output(&self) -> PathBuf {
        self.path("out.parquet")
    }
}

/// Read every row of a Parquet file
pub fn read_rows(path: &Path) -> Vec<Row> {
    let reader = SerializedFileReader::new(File::open(path).unwrap()).unwrap();
    reader
        .get_row_iter(None)
        .unwrap()
        .map(|row| row.unwrap())
        .collect()
}

/// Number of rows recorded in the footer
pub fn row_count(path: &Path) -> i64 {
    let reader = SerializedFileReader::new(File::open(path).unwrap()).unwrap();
    reader.metadata().file_metadata().num_rows()
}

/// Top-level column names recorded in the footer
pub fn column_names(path: &Path) -> Vec<String> {
    let reader = SerializedFileReader::new(File::open(path).unwrap()).unwrap();
    reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .root_schema()
        .get_fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect()
}

/// Sink wrapper that counts how often it gets finalized
pub struct CountingSink<S: RecordSink> {
    pub inner: S,
    pub finalized: Rc<Cell<usize>>,
}

impl<S: RecordSink> RecordSink for CountingSink<S> {
    fn write(&mut self, value: &TransportValue) -> Result<()> {
        self.inner.write(value)
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn finalize(self) -> Result<()> {
        self.finalized.set(self.finalized.get() + 1);
        self.inner.finalize()
    }
}
