//! Schema-bound record encoder

use crate::error::{Error, Result};
use crate::naming::FieldNameNormalizer;
use crate::types::{
    JsonObject, JsonValue, RecordMessage, UnknownFieldPolicy, COLUMN_NAME_EMITTED_AT,
    COLUMN_NAME_RECORD_ID,
};
use arrow::datatypes::{DataType, Field, SchemaRef, TimeUnit};
use std::collections::HashMap;
use uuid::Uuid;

/// One record shaped exactly like the declared schema.
///
/// Every schema field is present (possibly null) and nothing else is.
/// Transient: constructed per input record and consumed by the columnar
/// writer immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    values: JsonObject,
}

impl EncodedRecord {
    /// The encoded values, keyed by normalized field name in schema order
    pub fn values(&self) -> &JsonObject {
        &self.values
    }

    /// Look up a single encoded field
    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    #[cfg(test)]
    pub(crate) fn from_values(values: JsonObject) -> Self {
        Self { values }
    }
}

/// Converts input records into [`EncodedRecord`]s under a fixed schema.
///
/// The schema is immutable for the lifetime of the encoder and must carry the
/// two system columns ([`COLUMN_NAME_RECORD_ID`] as Utf8,
/// [`COLUMN_NAME_EMITTED_AT`] as millisecond timestamps). Field names are
/// run through an owned [`FieldNameNormalizer`] before matching, so the
/// mapping survives for reverse lookups via [`RecordEncoder::field_name_mapping`].
#[derive(Debug)]
pub struct RecordEncoder {
    schema: SchemaRef,
    normalizer: FieldNameNormalizer,
    policy: UnknownFieldPolicy,
}

impl RecordEncoder {
    /// Create an encoder for the given schema.
    ///
    /// Fails with `InvalidConfig` when the schema does not declare the system
    /// columns with the expected types.
    pub fn new(schema: SchemaRef, policy: UnknownFieldPolicy) -> Result<Self> {
        let id_field = schema
            .field_with_name(COLUMN_NAME_RECORD_ID)
            .map_err(|_| missing_system_column(COLUMN_NAME_RECORD_ID))?;
        if id_field.data_type() != &DataType::Utf8 {
            return Err(Error::invalid_config(
                "schema",
                format!("system column '{COLUMN_NAME_RECORD_ID}' must be Utf8"),
            ));
        }

        let emitted_field = schema
            .field_with_name(COLUMN_NAME_EMITTED_AT)
            .map_err(|_| missing_system_column(COLUMN_NAME_EMITTED_AT))?;
        if !matches!(
            emitted_field.data_type(),
            DataType::Timestamp(TimeUnit::Millisecond, _) | DataType::Int64
        ) {
            return Err(Error::invalid_config(
                "schema",
                format!(
                    "system column '{COLUMN_NAME_EMITTED_AT}' must be a millisecond timestamp"
                ),
            ));
        }

        Ok(Self {
            schema,
            normalizer: FieldNameNormalizer::new(),
            policy,
        })
    }

    /// The schema this encoder targets
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Read-only snapshot of the original -> normalized field name mapping
    pub fn field_name_mapping(&self) -> &HashMap<String, String> {
        self.normalizer.mapping()
    }

    /// Encode one record against the schema.
    ///
    /// The system columns are injected regardless of what the caller
    /// supplied: `_record_id` is a fresh UUIDv4 (any upstream id hint is
    /// ignored) and `_emitted_at` is propagated from the message. A failed
    /// encode is record-scoped and leaves the encoder usable, except that
    /// names already learned by the normalizer stay learned.
    ///
    /// The unknown-field policy applies to top-level fields only: extra keys
    /// inside a nested struct are dropped under either policy.
    pub fn encode(&mut self, record: &RecordMessage) -> Result<EncodedRecord> {
        let data = record.data.as_object().ok_or_else(|| {
            Error::schema_mismatch("$", "record payload must be a JSON object")
        })?;

        // Normalize top-level names first so system-column collisions are
        // caught before any value-level work.
        let mut normalized = JsonObject::new();
        for (key, value) in data {
            let name = self.normalizer.normalize(key)?;
            if name == COLUMN_NAME_RECORD_ID || name == COLUMN_NAME_EMITTED_AT {
                if *key == name {
                    // Same-named user field: the injected system value wins.
                    continue;
                }
                return Err(Error::name_collision(key.clone(), name.clone(), name));
            }
            normalized.insert(name, self.normalizer.normalize_keys(value)?);
        }

        let mut values = JsonObject::new();
        values.insert(
            COLUMN_NAME_RECORD_ID.to_string(),
            JsonValue::String(Uuid::new_v4().to_string()),
        );
        values.insert(
            COLUMN_NAME_EMITTED_AT.to_string(),
            JsonValue::from(record.emitted_at),
        );

        for field in self.schema.fields() {
            if field.name() == COLUMN_NAME_RECORD_ID || field.name() == COLUMN_NAME_EMITTED_AT {
                continue;
            }
            let value = encode_value(field.name(), normalized.get(field.name()), field)?;
            values.insert(field.name().clone(), value);
        }

        if self.policy == UnknownFieldPolicy::Fail {
            for key in normalized.keys() {
                if self.schema.field_with_name(key).is_err() {
                    return Err(Error::unknown_field(key.clone()));
                }
            }
        }

        Ok(EncodedRecord { values })
    }
}

fn missing_system_column(name: &str) -> Error {
    Error::invalid_config("schema", format!("missing system column '{name}'"))
}

/// Encode one value under one declared field, strictly.
///
/// No implicit widening or truncation: a value that does not fit the declared
/// type fails with `SchemaMismatch` instead of being clamped or coerced.
fn encode_value(path: &str, value: Option<&JsonValue>, field: &Field) -> Result<JsonValue> {
    let value = match value {
        None | Some(JsonValue::Null) => {
            if field.is_nullable() {
                return Ok(JsonValue::Null);
            }
            return Err(Error::schema_mismatch(
                path,
                "null value for non-nullable field",
            ));
        }
        Some(v) => v,
    };

    match field.data_type() {
        DataType::Utf8 => match value {
            JsonValue::String(s) => Ok(JsonValue::String(s.clone())),
            other => Err(type_mismatch(path, "string", other)),
        },

        DataType::Boolean => match value {
            JsonValue::Bool(b) => Ok(JsonValue::Bool(*b)),
            other => Err(type_mismatch(path, "boolean", other)),
        },

        DataType::Int32 => {
            let n = integer_value(path, value, "32-bit integer")?;
            if i32::try_from(n).is_err() {
                return Err(Error::schema_mismatch(
                    path,
                    format!("value {n} out of range for 32-bit integer"),
                ));
            }
            Ok(JsonValue::from(n))
        }

        DataType::Int64 => {
            let n = integer_value(path, value, "64-bit integer")?;
            Ok(JsonValue::from(n))
        }

        DataType::Float32 => {
            let f = float_value(path, value, "32-bit float")?;
            if f.is_finite() && f.abs() > f64::from(f32::MAX) {
                return Err(Error::schema_mismatch(
                    path,
                    format!("value {f} out of range for 32-bit float"),
                ));
            }
            Ok(value.clone())
        }

        DataType::Float64 => {
            float_value(path, value, "64-bit float")?;
            Ok(value.clone())
        }

        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let n = integer_value(path, value, "millisecond timestamp")?;
            Ok(JsonValue::from(n))
        }

        DataType::Struct(fields) => match value {
            JsonValue::Object(obj) => {
                let mut out = JsonObject::new();
                for child in fields {
                    let child_path = format!("{path}.{}", child.name());
                    let encoded = encode_value(&child_path, obj.get(child.name()), child)?;
                    out.insert(child.name().clone(), encoded);
                }
                Ok(JsonValue::Object(out))
            }
            other => Err(type_mismatch(path, "object", other)),
        },

        DataType::List(item) => match value {
            JsonValue::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, elem) in items.iter().enumerate() {
                    let elem_path = format!("{path}[{i}]");
                    out.push(encode_value(&elem_path, Some(elem), item)?);
                }
                Ok(JsonValue::Array(out))
            }
            other => Err(type_mismatch(path, "array", other)),
        },

        other => Err(Error::schema_mismatch(
            path,
            format!("unsupported schema type {other:?}"),
        )),
    }
}

/// Extract an exact integer, rejecting floats and integers beyond i64
fn integer_value(path: &str, value: &JsonValue, expected: &str) -> Result<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().ok_or_else(|| {
            Error::schema_mismatch(path, format!("value {n} does not fit {expected}"))
        }),
        other => Err(type_mismatch(path, expected, other)),
    }
}

/// Extract a float; integers are representable and accepted
fn float_value(path: &str, value: &JsonValue, expected: &str) -> Result<f64> {
    match value {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::schema_mismatch(path, format!("value {n} is not a valid float"))),
        other => Err(type_mismatch(path, expected, other)),
    }
}

fn type_mismatch(path: &str, expected: &str, got: &JsonValue) -> Error {
    let got = match got {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    };
    Error::schema_mismatch(path, format!("expected {expected}, got {got}"))
}
