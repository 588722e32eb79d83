//! Configuration types for destination definitions
//!
//! This module contains the configuration structures used to define a
//! destination in YAML format, plus the resolved-schema input format the CLI
//! accepts. Schema *discovery* from a catalog is out of scope; a
//! [`SchemaSpec`] is the already-resolved schema for one stream.

use crate::error::{Error, Result};
use crate::types::{UnknownFieldPolicy, COLUMN_NAME_EMITTED_AT, COLUMN_NAME_RECORD_ID};
use crate::writer::ParquetWriterConfig;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Destination Config
// ============================================================================

/// Complete destination configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Destination URL (`s3://bucket/prefix`, `gs://...`, `az://...`,
    /// or a local path)
    pub destination: String,

    /// Parquet writer tuning parameters
    #[serde(default)]
    pub format: ParquetWriterConfig,

    /// What to do with input fields outside the declared schema
    #[serde(default)]
    pub unknown_field_policy: UnknownFieldPolicy,
}

impl DestinationConfig {
    /// Load a destination config from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse a destination config from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.format.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Resolved Schema Spec
// ============================================================================

/// Field type in a resolved schema spec
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FieldType {
    String,
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    Timestamp,
    Object { fields: Vec<FieldSpec> },
    List { item: Box<FieldSpec> },
}

/// One field of a resolved schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

/// A resolved schema for one stream: an ordered field list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaSpec {
    pub fields: Vec<FieldSpec>,
}

impl SchemaSpec {
    /// Load a schema spec from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Convert to an Arrow schema, prepending the system columns.
    ///
    /// Declaring a field under a system column name is rejected; the system
    /// columns are owned by the writer.
    pub fn to_arrow(&self) -> Result<SchemaRef> {
        let mut fields = vec![
            Field::new(COLUMN_NAME_RECORD_ID, DataType::Utf8, false),
            Field::new(
                COLUMN_NAME_EMITTED_AT,
                DataType::Timestamp(TimeUnit::Millisecond, None),
                false,
            ),
        ];
        for spec in &self.fields {
            if spec.name == COLUMN_NAME_RECORD_ID || spec.name == COLUMN_NAME_EMITTED_AT {
                return Err(Error::invalid_config(
                    "schema",
                    format!("field '{}' is a reserved system column", spec.name),
                ));
            }
            fields.push(spec.to_arrow_field());
        }
        Ok(Arc::new(Schema::new(fields)))
    }
}

impl FieldSpec {
    fn to_arrow_field(&self) -> Field {
        Field::new(&self.name, self.to_arrow_type(), self.nullable)
    }

    fn to_arrow_type(&self) -> DataType {
        match &self.field_type {
            FieldType::String => DataType::Utf8,
            FieldType::Boolean => DataType::Boolean,
            FieldType::Integer => DataType::Int32,
            FieldType::Long => DataType::Int64,
            FieldType::Float => DataType::Float32,
            FieldType::Double => DataType::Float64,
            FieldType::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, None),
            FieldType::Object { fields } => DataType::Struct(
                fields
                    .iter()
                    .map(FieldSpec::to_arrow_field)
                    .collect::<Vec<_>>()
                    .into(),
            ),
            FieldType::List { item } => DataType::List(Arc::new(item.to_arrow_field())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_destination_config_defaults() {
        let config = DestinationConfig::from_yaml("destination: /tmp/out\n").unwrap();
        assert_eq!(config.destination, "/tmp/out");
        assert_eq!(config.unknown_field_policy, UnknownFieldPolicy::Drop);
    }

    #[test]
    fn test_destination_config_rejects_bad_format() {
        let yaml = "destination: /tmp/out\nformat:\n  page_size_bytes: 0\n";
        let err = DestinationConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_schema_spec_to_arrow() {
        let spec: SchemaSpec = serde_json::from_str(
            r#"{
                "fields": [
                    {"name": "name", "type": "string"},
                    {"name": "age", "type": "integer", "nullable": false},
                    {"name": "address", "type": "object", "fields": [
                        {"name": "zip", "type": "string"}
                    ]},
                    {"name": "scores", "type": "list", "item": {"name": "item", "type": "long"}}
                ]
            }"#,
        )
        .unwrap();

        let schema = spec.to_arrow().unwrap();
        assert_eq!(schema.fields().len(), 6); // two system columns + four declared

        assert_eq!(schema.field(0).name(), COLUMN_NAME_RECORD_ID);
        assert_eq!(schema.field(1).name(), COLUMN_NAME_EMITTED_AT);

        let age = schema.field_with_name("age").unwrap();
        assert_eq!(age.data_type(), &DataType::Int32);
        assert!(!age.is_nullable());

        let address = schema.field_with_name("address").unwrap();
        assert!(matches!(address.data_type(), DataType::Struct(_)));

        let scores = schema.field_with_name("scores").unwrap();
        assert!(matches!(scores.data_type(), DataType::List(_)));
    }

    #[test]
    fn test_schema_spec_rejects_system_column_names() {
        let spec = SchemaSpec {
            fields: vec![FieldSpec {
                name: COLUMN_NAME_RECORD_ID.to_string(),
                field_type: FieldType::String,
                nullable: true,
            }],
        };
        let err = spec.to_arrow().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
