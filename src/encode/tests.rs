//! Tests for record encoding

use super::*;
use crate::error::Error;
use crate::types::{
    RecordMessage, UnknownFieldPolicy, COLUMN_NAME_EMITTED_AT, COLUMN_NAME_RECORD_ID,
};
use arrow::datatypes::{DataType, Field, Fields, Schema, SchemaRef, TimeUnit};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn schema_with(fields: Vec<Field>) -> SchemaRef {
    let mut all = vec![
        Field::new(COLUMN_NAME_RECORD_ID, DataType::Utf8, false),
        Field::new(
            COLUMN_NAME_EMITTED_AT,
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
    ];
    all.extend(fields);
    Arc::new(Schema::new(all))
}

fn encoder(fields: Vec<Field>, policy: UnknownFieldPolicy) -> RecordEncoder {
    RecordEncoder::new(schema_with(fields), policy).unwrap()
}

fn record(data: serde_json::Value) -> RecordMessage {
    RecordMessage::new("users", data, 1_700_000_000_000)
}

// ============================================================================
// System Column Tests
// ============================================================================

#[test]
fn test_system_columns_injected() {
    let mut enc = encoder(
        vec![Field::new("name", DataType::Utf8, true)],
        UnknownFieldPolicy::Drop,
    );

    let out = enc.encode(&record(json!({"name": "alice"}))).unwrap();

    let id = out.get(COLUMN_NAME_RECORD_ID).unwrap().as_str().unwrap();
    assert!(Uuid::parse_str(id).is_ok());
    assert_eq!(
        out.get(COLUMN_NAME_EMITTED_AT).unwrap().as_i64(),
        Some(1_700_000_000_000)
    );
    assert_eq!(out.get("name"), Some(&json!("alice")));
}

#[test]
fn test_record_id_fresh_per_record() {
    let mut enc = encoder(vec![], UnknownFieldPolicy::Drop);

    let a = enc.encode(&record(json!({}))).unwrap();
    let b = enc.encode(&record(json!({}))).unwrap();
    assert_ne!(a.get(COLUMN_NAME_RECORD_ID), b.get(COLUMN_NAME_RECORD_ID));
}

#[test]
fn test_user_field_same_name_as_system_is_overridden() {
    let mut enc = encoder(vec![], UnknownFieldPolicy::Drop);

    let out = enc
        .encode(&record(json!({"_emitted_at": 42})))
        .unwrap();
    assert_eq!(
        out.get(COLUMN_NAME_EMITTED_AT).unwrap().as_i64(),
        Some(1_700_000_000_000)
    );
}

#[test]
fn test_user_field_colliding_with_system_name_fails() {
    let mut enc = encoder(vec![], UnknownFieldPolicy::Drop);

    let err = enc.encode(&record(json!({"_emitted.at": 42}))).unwrap_err();
    assert!(matches!(err, Error::NameCollision { .. }));
}

#[test]
fn test_schema_without_system_columns_rejected() {
    let schema = Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, true)]));
    let err = RecordEncoder::new(schema, UnknownFieldPolicy::Drop).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
}

// ============================================================================
// Normalization Tests
// ============================================================================

#[test]
fn test_input_names_normalized_before_matching() {
    let mut enc = encoder(
        vec![Field::new("user_name", DataType::Utf8, true)],
        UnknownFieldPolicy::Drop,
    );

    let out = enc.encode(&record(json!({"user-name": "bob"}))).unwrap();
    assert_eq!(out.get("user_name"), Some(&json!("bob")));
    assert_eq!(
        enc.field_name_mapping().get("user-name"),
        Some(&"user_name".to_string())
    );
}

#[test]
fn test_colliding_input_names_fail() {
    let mut enc = encoder(
        vec![Field::new("a_b", DataType::Utf8, true)],
        UnknownFieldPolicy::Drop,
    );

    let err = enc
        .encode(&record(json!({"a-b": "x", "a.b": "y"})))
        .unwrap_err();
    assert!(matches!(err, Error::NameCollision { .. }));
}

// ============================================================================
// Unknown Field Policy Tests
// ============================================================================

#[test]
fn test_unknown_field_dropped() {
    let mut enc = encoder(
        vec![Field::new("name", DataType::Utf8, true)],
        UnknownFieldPolicy::Drop,
    );

    let out = enc
        .encode(&record(json!({"name": "alice", "extra": 1})))
        .unwrap();
    assert_eq!(out.get("extra"), None);
    assert_eq!(out.values().len(), 3); // two system columns + name
}

#[test]
fn test_nested_unknown_field_dropped_even_under_fail() {
    let nested = Fields::from(vec![Field::new("zip", DataType::Utf8, true)]);
    let mut enc = encoder(
        vec![Field::new("address", DataType::Struct(nested), true)],
        UnknownFieldPolicy::Fail,
    );

    // The policy only covers top-level fields; struct extras are dropped
    let out = enc
        .encode(&record(json!({"address": {"zip": "10115", "extra": true}})))
        .unwrap();
    assert_eq!(out.get("address"), Some(&json!({"zip": "10115"})));
}

#[test]
fn test_unknown_field_fails_when_policy_fail() {
    let mut enc = encoder(
        vec![Field::new("name", DataType::Utf8, true)],
        UnknownFieldPolicy::Fail,
    );

    let err = enc
        .encode(&record(json!({"name": "alice", "extra": 1})))
        .unwrap_err();
    match err {
        Error::UnknownField { field } => assert_eq!(field, "extra"),
        other => panic!("expected UnknownField, got {other:?}"),
    }
}

// ============================================================================
// Strict Typing Tests
// ============================================================================

#[test]
fn test_int32_overflow_rejected() {
    let mut enc = encoder(
        vec![Field::new("count", DataType::Int32, true)],
        UnknownFieldPolicy::Drop,
    );

    let out = enc.encode(&record(json!({"count": 123}))).unwrap();
    assert_eq!(out.get("count"), Some(&json!(123)));

    let err = enc
        .encode(&record(json!({"count": 4_000_000_000_i64})))
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[test]
fn test_float_not_accepted_as_integer() {
    let mut enc = encoder(
        vec![Field::new("count", DataType::Int64, true)],
        UnknownFieldPolicy::Drop,
    );

    let err = enc.encode(&record(json!({"count": 1.5}))).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[test]
fn test_float32_range_checked() {
    let mut enc = encoder(
        vec![Field::new("ratio", DataType::Float32, true)],
        UnknownFieldPolicy::Drop,
    );

    enc.encode(&record(json!({"ratio": 0.5}))).unwrap();

    let err = enc.encode(&record(json!({"ratio": 1e39}))).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[test]
fn test_string_where_struct_expected() {
    let nested = Fields::from(vec![Field::new("zip", DataType::Utf8, true)]);
    let mut enc = encoder(
        vec![Field::new("address", DataType::Struct(nested), true)],
        UnknownFieldPolicy::Drop,
    );

    let err = enc
        .encode(&record(json!({"address": "not an object"})))
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[test]
fn test_null_for_non_nullable_field() {
    let mut enc = encoder(
        vec![Field::new("name", DataType::Utf8, false)],
        UnknownFieldPolicy::Drop,
    );

    let err = enc.encode(&record(json!({"name": null}))).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}

#[test]
fn test_missing_nullable_field_encodes_null() {
    let mut enc = encoder(
        vec![Field::new("name", DataType::Utf8, true)],
        UnknownFieldPolicy::Drop,
    );

    let out = enc.encode(&record(json!({}))).unwrap();
    assert_eq!(out.get("name"), Some(&serde_json::Value::Null));
}

#[test]
fn test_nested_struct_and_list() {
    let address = Fields::from(vec![
        Field::new("city", DataType::Utf8, true),
        Field::new("zip", DataType::Utf8, true),
    ]);
    let mut enc = encoder(
        vec![
            Field::new("address", DataType::Struct(address), true),
            Field::new(
                "scores",
                DataType::List(Arc::new(Field::new("item", DataType::Int64, true))),
                true,
            ),
        ],
        UnknownFieldPolicy::Drop,
    );

    let out = enc
        .encode(&record(json!({
            "address": {"city": "Berlin", "zip": "10115", "ignored": true},
            "scores": [1, 2, 3]
        })))
        .unwrap();

    assert_eq!(
        out.get("address"),
        Some(&json!({"city": "Berlin", "zip": "10115"}))
    );
    assert_eq!(out.get("scores"), Some(&json!([1, 2, 3])));
}

#[test]
fn test_failed_encode_leaves_encoder_usable() {
    let mut enc = encoder(
        vec![Field::new("count", DataType::Int32, true)],
        UnknownFieldPolicy::Drop,
    );

    enc.encode(&record(json!({"count": "oops"}))).unwrap_err();
    let out = enc.encode(&record(json!({"count": 7}))).unwrap();
    assert_eq!(out.get("count"), Some(&json!(7)));
}

#[test]
fn test_non_object_payload_rejected() {
    let mut enc = encoder(vec![], UnknownFieldPolicy::Drop);
    let err = enc.encode(&record(json!(["not", "an", "object"]))).unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
}
