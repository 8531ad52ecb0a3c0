//! BigQuery JSON table schemas

use super::{IntermediateSchema, PrimitiveType, SchemaBuilder, SchemaNode};
use crate::{ColumnifyError, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FieldSchema {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

/// Either a bare field array or a `{"fields": [...]}` table schema
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableSchema {
    Fields(Vec<FieldSchema>),
    Table { fields: Vec<FieldSchema> },
}

pub(super) fn resolve(content: &[u8]) -> Result<IntermediateSchema> {
    let table: TableSchema = serde_json::from_slice(content)
        .map_err(|e| ColumnifyError::schema(format!("malformed bigquery schema: {}", e)))?;
    let fields = match table {
        TableSchema::Fields(fields) | TableSchema::Table { fields } => fields,
    };

    let nodes = fields
        .iter()
        .map(convert_field)
        .collect::<Result<Vec<_>>>()?;
    SchemaBuilder::new("root").with_fields(nodes).build()
}

fn convert_field(field: &FieldSchema) -> Result<SchemaNode> {
    let base = match field.field_type.to_ascii_uppercase().as_str() {
        "RECORD" | "STRUCT" => SchemaNode::Struct {
            name: field.name.clone(),
            nullable: false,
            fields: field
                .fields
                .iter()
                .map(convert_field)
                .collect::<Result<Vec<_>>>()?,
        },
        other => SchemaNode::primitive(&field.name, primitive_for(other, &field.name)?, false),
    };

    match field
        .mode
        .as_deref()
        .map(str::to_ascii_uppercase)
        .as_deref()
        .unwrap_or("NULLABLE")
    {
        "NULLABLE" => Ok(base.with_nullable(true)),
        "REQUIRED" => Ok(base),
        "REPEATED" => Ok(SchemaNode::List {
            name: field.name.clone(),
            nullable: false,
            item: Box::new(base.renamed("item")),
        }),
        other => Err(ColumnifyError::schema(format!(
            "unknown mode '{}' for field '{}'",
            other, field.name
        ))),
    }
}

fn primitive_for(field_type: &str, field_name: &str) -> Result<PrimitiveType> {
    Ok(match field_type {
        "STRING" => PrimitiveType::String,
        "BYTES" => PrimitiveType::Binary,
        "INTEGER" | "INT64" => PrimitiveType::Int64,
        "FLOAT" | "FLOAT64" => PrimitiveType::Float64,
        "BOOLEAN" | "BOOL" => PrimitiveType::Boolean,
        "DATE" => PrimitiveType::Date32,
        "TIME" => PrimitiveType::TimeMicros,
        "TIMESTAMP" | "DATETIME" => PrimitiveType::TimestampMicros,
        other => {
            return Err(ColumnifyError::schema(format!(
                "unsupported bigquery type '{}' for field '{}'",
                other, field_name
            )))
        }
    })
}
