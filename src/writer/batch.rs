//! Encoded record to Arrow RecordBatch conversion

use crate::encode::EncodedRecord;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use arrow::array::{
    ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, ListArray,
    StringArray, StructArray, TimestampMillisecondArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Fields, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Build one RecordBatch from schema-shaped encoded records.
///
/// The encoder has already rejected anything the schema cannot represent; a
/// mistyped value that still slips through surfaces as a `SchemaMismatch`
/// for the column, never as a silently nulled cell.
pub fn records_to_batch(schema: &SchemaRef, records: &[EncodedRecord]) -> Result<RecordBatch> {
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let values: Vec<Option<&JsonValue>> = records
            .iter()
            .map(|record| record.get(field.name()))
            .collect();
        columns.push(build_array(field.name(), &values, field.data_type())?);
    }

    RecordBatch::try_new(Arc::clone(schema), columns).map_err(Error::from)
}

/// Build an Arrow array from encoded values of one column
fn build_array(name: &str, values: &[Option<&JsonValue>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Boolean => {
            let arr = scalar_values(name, values, "boolean", JsonValue::as_bool)?;
            Ok(Arc::new(BooleanArray::from(arr)))
        }

        DataType::Int32 => {
            let arr = scalar_values(name, values, "32-bit integer", |v| {
                v.as_i64().and_then(|n| i32::try_from(n).ok())
            })?;
            Ok(Arc::new(Int32Array::from(arr)))
        }

        DataType::Int64 => {
            let arr = scalar_values(name, values, "64-bit integer", JsonValue::as_i64)?;
            Ok(Arc::new(Int64Array::from(arr)))
        }

        DataType::Float32 => {
            let arr = scalar_values(name, values, "32-bit float", |v| {
                v.as_f64().map(|f| f as f32)
            })?;
            Ok(Arc::new(Float32Array::from(arr)))
        }

        DataType::Float64 => {
            let arr = scalar_values(name, values, "64-bit float", JsonValue::as_f64)?;
            Ok(Arc::new(Float64Array::from(arr)))
        }

        DataType::Utf8 => {
            let arr = scalar_values(name, values, "string", |v| {
                v.as_str().map(ToString::to_string)
            })?;
            Ok(Arc::new(StringArray::from(arr)))
        }

        DataType::Timestamp(TimeUnit::Millisecond, tz) => {
            let arr = scalar_values(name, values, "millisecond timestamp", JsonValue::as_i64)?;
            let arr = TimestampMillisecondArray::from(arr);
            let arr = match tz {
                Some(tz) => arr.with_timezone(tz.as_ref()),
                None => arr,
            };
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(name, values, field),

        DataType::Struct(fields) => build_struct_array(values, fields),

        other => Err(Error::schema_mismatch(
            name,
            format!("unsupported schema type {other:?}"),
        )),
    }
}

/// Extract scalar column values, failing on a present-but-mistyped value
fn scalar_values<'a, T, F>(
    name: &str,
    values: &[Option<&'a JsonValue>],
    expected: &str,
    extract: F,
) -> Result<Vec<Option<T>>>
where
    F: Fn(&'a JsonValue) -> Option<T>,
{
    values
        .iter()
        .map(|v| match v {
            None | Some(JsonValue::Null) => Ok(None),
            Some(v) => extract(v).map(Some).ok_or_else(|| {
                Error::schema_mismatch(name, format!("expected {expected} in encoded record"))
            }),
        })
        .collect()
}

/// Build a list array from encoded JSON arrays
fn build_list_array(
    name: &str,
    values: &[Option<&JsonValue>],
    field: &Arc<Field>,
) -> Result<ArrayRef> {
    let mut all_items: Vec<Option<&JsonValue>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];
    let mut validity: Vec<bool> = Vec::with_capacity(values.len());

    for value in values {
        match value {
            Some(JsonValue::Array(arr)) => {
                for item in arr {
                    all_items.push(Some(item));
                }
                validity.push(true);
            }
            None | Some(JsonValue::Null) => validity.push(false),
            Some(_) => {
                return Err(Error::schema_mismatch(
                    name,
                    "expected array in encoded record",
                ));
            }
        }
        // Every row carries an offset, null rows as an empty slot
        let offset = i32::try_from(all_items.len())
            .map_err(|_| Error::sink("array too large for i32 offset"))?;
        offsets.push(offset);
    }

    let items_array = build_array(field.name(), &all_items, field.data_type())?;
    let offset_buffer = OffsetBuffer::new(offsets.into());
    let nulls = NullBuffer::from(validity);

    let list_array = ListArray::new(Arc::clone(field), offset_buffer, items_array, Some(nulls));
    Ok(Arc::new(list_array))
}

/// Build a struct array from encoded JSON objects
fn build_struct_array(values: &[Option<&JsonValue>], fields: &Fields) -> Result<ArrayRef> {
    let mut child_arrays: Vec<ArrayRef> = Vec::with_capacity(fields.len());

    for field in fields {
        let child_values: Vec<Option<&JsonValue>> = values
            .iter()
            .map(|v| {
                v.and_then(|v| {
                    if let JsonValue::Object(obj) = v {
                        obj.get(field.name())
                    } else {
                        None
                    }
                })
            })
            .collect();
        child_arrays.push(build_array(field.name(), &child_values, field.data_type())?);
    }

    let validity: Vec<bool> = values
        .iter()
        .map(|v| matches!(v, Some(JsonValue::Object(_))))
        .collect();

    let struct_array = StructArray::new(
        fields.clone(),
        child_arrays,
        Some(NullBuffer::from(validity)),
    );
    Ok(Arc::new(struct_array))
}
