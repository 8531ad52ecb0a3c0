//! Avro schema documents (`.avsc`)

use super::{IntermediateSchema, PrimitiveType, SchemaBuilder, SchemaNode};
use crate::{ColumnifyError, Result};
use apache_avro::schema::{Name, RecordSchema, ResolvedSchema, Schema, SchemaKind};
use std::collections::HashMap;

pub(super) fn resolve(content: &[u8]) -> Result<IntermediateSchema> {
    let schema = Schema::parse_reader(&mut &content[..])
        .map_err(|e| ColumnifyError::schema(format!("malformed avro schema: {}", e)))?;
    let resolved = ResolvedSchema::try_from(&schema)
        .map_err(|e| ColumnifyError::schema(format!("unresolvable avro schema: {}", e)))?;

    let record = match &schema {
        Schema::Record(record) => record,
        other => {
            return Err(ColumnifyError::schema(format!(
                "top-level avro schema must be a record, got {:?}",
                SchemaKind::from(other)
            )))
        }
    };

    let mut converter = Converter {
        names: resolved.get_names(),
        visiting: Vec::new(),
    };
    let fields = converter.record_fields(record)?;
    SchemaBuilder::new(record.name.name.as_str())
        .with_fields(fields)
        .build()
}

/// Walks a parsed Avro schema, following named references
struct Converter<'s> {
    names: &'s HashMap<Name, &'s Schema>,
    /// Records currently being converted, to reject recursive types
    visiting: Vec<Name>,
}

impl<'s> Converter<'s> {
    fn record_fields(&mut self, record: &RecordSchema) -> Result<Vec<SchemaNode>> {
        self.visiting.push(record.name.clone());
        let fields = record
            .fields
            .iter()
            .map(|field| self.convert(&field.schema, &field.name))
            .collect();
        self.visiting.pop();
        fields
    }

    fn convert(&mut self, schema: &Schema, field_name: &str) -> Result<SchemaNode> {
        let primitive = match schema {
            Schema::Boolean => PrimitiveType::Boolean,
            Schema::Int => PrimitiveType::Int32,
            Schema::Long => PrimitiveType::Int64,
            Schema::Float => PrimitiveType::Float32,
            Schema::Double => PrimitiveType::Float64,
            Schema::Bytes | Schema::Fixed(_) => PrimitiveType::Binary,
            Schema::String | Schema::Enum(_) | Schema::Uuid => PrimitiveType::String,
            Schema::Date => PrimitiveType::Date32,
            Schema::TimeMillis => PrimitiveType::TimeMillis,
            Schema::TimeMicros => PrimitiveType::TimeMicros,
            Schema::TimestampMillis | Schema::LocalTimestampMillis => {
                PrimitiveType::TimestampMillis
            }
            Schema::TimestampMicros | Schema::LocalTimestampMicros => {
                PrimitiveType::TimestampMicros
            }
            Schema::Array(array) => {
                return Ok(SchemaNode::List {
                    name: field_name.to_string(),
                    nullable: false,
                    item: Box::new(self.convert(&array.items, "item")?),
                })
            }
            Schema::Map(map) => {
                return Ok(SchemaNode::Map {
                    name: field_name.to_string(),
                    nullable: false,
                    value: Box::new(self.convert(&map.types, "value")?),
                })
            }
            Schema::Union(union) => return self.union_node(union.variants(), field_name),
            Schema::Record(record) => {
                return Ok(SchemaNode::Struct {
                    name: field_name.to_string(),
                    nullable: false,
                    fields: self.record_fields(record)?,
                })
            }
            Schema::Ref { name } => {
                if self.visiting.contains(name) {
                    return Err(ColumnifyError::schema(format!(
                        "recursive type '{}' cannot be written as columns",
                        name.fullname(None)
                    )));
                }
                let target = self.names.get(name).copied().ok_or_else(|| {
                    ColumnifyError::schema(format!(
                        "unknown avro type '{}' for field '{}'",
                        name.fullname(None),
                        field_name
                    ))
                })?;
                return self.convert(target, field_name);
            }
            Schema::Null => {
                return Err(ColumnifyError::schema(format!(
                    "field '{}' has type null, which has no column representation",
                    field_name
                )))
            }
            Schema::Decimal(_) | Schema::BigDecimal => {
                return Err(ColumnifyError::schema(format!(
                    "decimal field '{}' is not supported",
                    field_name
                )))
            }
            other => {
                return Err(ColumnifyError::schema(format!(
                    "avro type {:?} of field '{}' is not supported",
                    SchemaKind::from(other),
                    field_name
                )))
            }
        };
        Ok(SchemaNode::primitive(field_name, primitive, false))
    }

    fn union_node(&mut self, variants: &[Schema], field_name: &str) -> Result<SchemaNode> {
        let has_null = variants.iter().any(|v| matches!(v, Schema::Null));
        let others: Vec<&Schema> = variants
            .iter()
            .filter(|v| !matches!(v, Schema::Null))
            .collect();

        match others.as_slice() {
            [single] => Ok(self.convert(single, field_name)?.with_nullable(has_null)),
            [] => Err(ColumnifyError::schema(format!(
                "union for field '{}' has no non-null branch",
                field_name
            ))),
            _ => Err(ColumnifyError::schema(format!(
                "union for field '{}' has more than one non-null branch",
                field_name
            ))),
        }
    }
}
