//! Intermediate schema shared by the decoders and the columnar writer
//!
//! A schema is resolved once per run from a schema file and never changes
//! afterwards. Field order is significant: delimited-text decoders map
//! positional cells onto it and the writer derives its column order from it.

mod avro;
mod bigquery;

use crate::{ColumnifyError, Result};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Ordered, immutable list of top-level fields
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateSchema {
    name: String,
    fields: Vec<SchemaNode>,
}

/// Represents a field in the schema tree
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A struct with named fields
    Struct {
        name: String,
        nullable: bool,
        fields: Vec<SchemaNode>,
    },
    /// A list containing items of a single type
    List {
        name: String,
        nullable: bool,
        item: Box<SchemaNode>,
    },
    /// A map from string keys to values of a single type
    Map {
        name: String,
        nullable: bool,
        value: Box<SchemaNode>,
    },
    /// A primitive/leaf type
    Primitive {
        name: String,
        primitive_type: PrimitiveType,
        nullable: bool,
    },
}

/// Leaf data types a schema can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Binary,

    /// Days since the Unix epoch
    Date32,
    /// Milliseconds since midnight
    TimeMillis,
    /// Microseconds since midnight
    TimeMicros,
    /// Milliseconds since the Unix epoch, UTC
    TimestampMillis,
    /// Microseconds since the Unix epoch, UTC
    TimestampMicros,
}

/// Represents how values are repeated in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    /// Field must have exactly one value
    Required,
    /// Field can have 0 or 1 value
    Optional,
}

/// Schema description languages a schema file can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    Avro,
    BigQuery,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "avro",
            SchemaType::BigQuery => "bigquery",
        }
    }
}

impl FromStr for SchemaType {
    type Err = ColumnifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "avro" => Ok(SchemaType::Avro),
            "bigquery" => Ok(SchemaType::BigQuery),
            other => Err(ColumnifyError::schema(format!(
                "unsupported schema type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve schema file contents into an [`IntermediateSchema`]
///
/// Identical bytes and schema type always produce the same field order.
pub fn resolve(content: &[u8], schema_type: SchemaType) -> Result<IntermediateSchema> {
    let schema = match schema_type {
        SchemaType::Avro => avro::resolve(content)?,
        SchemaType::BigQuery => bigquery::resolve(content)?,
    };

    tracing::debug!(
        schema_type = %schema_type,
        fields = schema.fields.len(),
        "resolved intermediate schema"
    );

    Ok(schema)
}

/// Resolve schema file contents keyed by a schema type tag
pub fn get_schema(content: &[u8], schema_type: &str) -> Result<IntermediateSchema> {
    resolve(content, schema_type.parse()?)
}

impl IntermediateSchema {
    /// Name of the top-level record
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level fields in declaration order
    pub fn fields(&self) -> &[SchemaNode] {
        &self.fields
    }

    /// Look up a top-level field by name
    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Top-level field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(SchemaNode::name).collect()
    }
}

impl SchemaNode {
    /// Shorthand for a leaf field
    pub fn primitive<S: Into<String>>(name: S, primitive_type: PrimitiveType, nullable: bool) -> Self {
        SchemaNode::Primitive {
            name: name.into(),
            primitive_type,
            nullable,
        }
    }

    /// Get the name of this schema node
    pub fn name(&self) -> &str {
        match self {
            SchemaNode::Struct { name, .. } => name,
            SchemaNode::List { name, .. } => name,
            SchemaNode::Map { name, .. } => name,
            SchemaNode::Primitive { name, .. } => name,
        }
    }

    /// Check if this node is nullable
    pub fn is_nullable(&self) -> bool {
        match self {
            SchemaNode::Struct { nullable, .. } => *nullable,
            SchemaNode::List { nullable, .. } => *nullable,
            SchemaNode::Map { nullable, .. } => *nullable,
            SchemaNode::Primitive { nullable, .. } => *nullable,
        }
    }

    /// Get the repetition level based on nullability
    pub fn repetition(&self) -> Repetition {
        if self.is_nullable() {
            Repetition::Optional
        } else {
            Repetition::Required
        }
    }

    /// The leaf type, if this is a primitive node
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            SchemaNode::Primitive { primitive_type, .. } => Some(*primitive_type),
            _ => None,
        }
    }

    /// Copy of this node under another name
    pub(crate) fn renamed<S: Into<String>>(self, new_name: S) -> Self {
        let new_name = new_name.into();
        match self {
            SchemaNode::Struct {
                nullable, fields, ..
            } => SchemaNode::Struct {
                name: new_name,
                nullable,
                fields,
            },
            SchemaNode::List { nullable, item, .. } => SchemaNode::List {
                name: new_name,
                nullable,
                item,
            },
            SchemaNode::Map {
                nullable, value, ..
            } => SchemaNode::Map {
                name: new_name,
                nullable,
                value,
            },
            SchemaNode::Primitive {
                primitive_type,
                nullable,
                ..
            } => SchemaNode::Primitive {
                name: new_name,
                primitive_type,
                nullable,
            },
        }
    }

    /// Copy of this node with the given nullability
    pub(crate) fn with_nullable(mut self, value: bool) -> Self {
        match &mut self {
            SchemaNode::Struct { nullable, .. }
            | SchemaNode::List { nullable, .. }
            | SchemaNode::Map { nullable, .. }
            | SchemaNode::Primitive { nullable, .. } => *nullable = value,
        }
        self
    }
}

impl PrimitiveType {
    /// Get the logical type name for display
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::Float32 => "Float32",
            PrimitiveType::Float64 => "Float64",
            PrimitiveType::String => "String",
            PrimitiveType::Binary => "Binary",
            PrimitiveType::Date32 => "Date32",
            PrimitiveType::TimeMillis => "TimeMillis",
            PrimitiveType::TimeMicros => "TimeMicros",
            PrimitiveType::TimestampMillis => "TimestampMillis",
            PrimitiveType::TimestampMicros => "TimestampMicros",
        }
    }
}

/// Builder for creating schemas
pub struct SchemaBuilder {
    name: String,
    fields: Vec<SchemaNode>,
}

impl SchemaBuilder {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: SchemaNode) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_fields<I: IntoIterator<Item = SchemaNode>>(mut self, fields: I) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Validate and build the schema
    ///
    /// Fails when there are no fields, when names repeat within one struct,
    /// or when a nested struct is empty.
    pub fn build(self) -> Result<IntermediateSchema> {
        if self.fields.is_empty() {
            return Err(ColumnifyError::schema(format!(
                "record '{}' has no fields",
                self.name
            )));
        }
        validate_fields(&self.name, &self.fields)?;

        Ok(IntermediateSchema {
            name: self.name,
            fields: self.fields,
        })
    }
}

fn validate_fields(parent: &str, fields: &[SchemaNode]) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.name().is_empty() {
            return Err(ColumnifyError::schema(format!(
                "field without a name in '{}'",
                parent
            )));
        }
        if !seen.insert(field.name()) {
            return Err(ColumnifyError::schema(format!(
                "duplicate field '{}' in '{}'",
                field.name(),
                parent
            )));
        }
        validate_node(field)?;
    }
    Ok(())
}

fn validate_node(node: &SchemaNode) -> Result<()> {
    match node {
        SchemaNode::Struct { name, fields, .. } => {
            if fields.is_empty() {
                return Err(ColumnifyError::schema(format!(
                    "struct '{}' has no fields",
                    name
                )));
            }
            validate_fields(name, fields)
        }
        SchemaNode::List { item, .. } => validate_node(item),
        SchemaNode::Map { value, .. } => validate_node(value),
        SchemaNode::Primitive { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let schema = SchemaBuilder::new("root")
            .with_field(SchemaNode::primitive("id", PrimitiveType::Int64, false))
            .with_field(SchemaNode::primitive("name", PrimitiveType::String, true))
            .build()
            .unwrap();

        assert_eq!(schema.name(), "root");
        assert_eq!(schema.field_names(), vec!["id", "name"]);
        assert!(!schema.field("id").unwrap().is_nullable());
        assert_eq!(
            schema.field("name").unwrap().repetition(),
            Repetition::Optional
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = SchemaBuilder::new("root")
            .with_field(SchemaNode::primitive("id", PrimitiveType::Int64, false))
            .with_field(SchemaNode::primitive("id", PrimitiveType::String, true))
            .build();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("duplicate field 'id'"));
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert!(SchemaBuilder::new("root").build().is_err());

        let nested = SchemaBuilder::new("root")
            .with_field(SchemaNode::Struct {
                name: "empty".to_string(),
                nullable: true,
                fields: vec![],
            })
            .build();
        assert!(nested.is_err());
    }

    #[test]
    fn test_schema_type_tags() {
        assert_eq!("avro".parse::<SchemaType>().unwrap(), SchemaType::Avro);
        assert_eq!(
            "bigquery".parse::<SchemaType>().unwrap(),
            SchemaType::BigQuery
        );
        assert!("protobuf".parse::<SchemaType>().is_err());
    }

    #[test]
    fn test_rename_and_nullability() {
        let node = SchemaNode::primitive("a", PrimitiveType::Int32, false)
            .renamed("b")
            .with_nullable(true);
        assert_eq!(node.name(), "b");
        assert!(node.is_nullable());
        assert_eq!(node.primitive_type(), Some(PrimitiveType::Int32));
    }
}
