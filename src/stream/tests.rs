//! Tests for the stream writer lifecycle

use super::*;
use crate::error::Error;
use crate::sink::CloudSink;
use crate::types::{
    RecordMessage, UnknownFieldPolicy, COLUMN_NAME_EMITTED_AT, COLUMN_NAME_RECORD_ID,
};
use crate::writer::ParquetWriterConfig;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::json;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use uuid::Uuid;

fn test_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(COLUMN_NAME_RECORD_ID, DataType::Utf8, false),
        Field::new(
            COLUMN_NAME_EMITTED_AT,
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new("name", DataType::Utf8, true),
    ]))
}

async fn open_writer(sink: &CloudSink) -> ParquetStreamWriter {
    ParquetStreamWriter::open(
        sink,
        "users",
        test_schema(),
        &ParquetWriterConfig::default(),
        UnknownFieldPolicy::Drop,
    )
    .await
    .unwrap()
}

fn record(name: &str) -> RecordMessage {
    RecordMessage::new("users", json!({"name": name}), 1_700_000_000_000)
}

fn count_rows(path: &Path) -> i64 {
    let file = File::open(path).unwrap();
    let reader = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
    reader.metadata().file_metadata().num_rows()
}

#[tokio::test]
async fn test_close_success_produces_readable_object() {
    let temp = tempdir().unwrap();
    let sink = CloudSink::parse(temp.path().to_str().unwrap()).unwrap();
    let mut writer = open_writer(&sink).await;

    for name in ["alice", "bob", "carol"] {
        writer.write(Uuid::new_v4(), &record(name)).unwrap();
    }
    writer.close(false).await.unwrap();

    assert_eq!(writer.state(), WriterState::ClosedSuccess);
    let path = temp.path().join(writer.object_key());
    assert!(path.exists());
    assert_eq!(count_rows(&path), 3);
}

#[tokio::test]
async fn test_close_failure_leaves_no_readable_object() {
    let temp = tempdir().unwrap();
    let sink = CloudSink::parse(temp.path().to_str().unwrap()).unwrap();
    let mut writer = open_writer(&sink).await;

    writer.write(Uuid::new_v4(), &record("alice")).unwrap();
    writer.close(true).await.unwrap();

    assert_eq!(writer.state(), WriterState::ClosedFailure);
    assert!(!temp.path().join(writer.object_key()).exists());
}

#[tokio::test]
async fn test_write_after_close_fails() {
    let temp = tempdir().unwrap();
    let sink = CloudSink::parse(temp.path().to_str().unwrap()).unwrap();
    let mut writer = open_writer(&sink).await;
    writer.close(false).await.unwrap();

    let err = writer.write(Uuid::new_v4(), &record("late")).unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));
}

#[tokio::test]
async fn test_double_close_fails() {
    let temp = tempdir().unwrap();
    let sink = CloudSink::parse(temp.path().to_str().unwrap()).unwrap();
    let mut writer = open_writer(&sink).await;
    writer.close(false).await.unwrap();

    let err = writer.close(false).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyClosed { .. }));

    let err = writer.close(true).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyClosed { .. }));
}

#[tokio::test]
async fn test_record_scoped_error_does_not_poison_writer() {
    let temp = tempdir().unwrap();
    let sink = CloudSink::parse(temp.path().to_str().unwrap()).unwrap();
    let mut writer = open_writer(&sink).await;

    let bad = RecordMessage::new("users", json!({"name": 42}), 1);
    let err = writer.write(Uuid::new_v4(), &bad).unwrap_err();
    assert!(err.is_record_scoped());

    writer.write(Uuid::new_v4(), &record("alice")).unwrap();
    writer.close(false).await.unwrap();

    assert_eq!(count_rows(&temp.path().join(writer.object_key())), 1);
}

#[tokio::test]
async fn test_object_key_fixed_at_open() {
    let temp = tempdir().unwrap();
    let sink = CloudSink::parse(temp.path().to_str().unwrap()).unwrap();
    let mut writer = open_writer(&sink).await;

    let key = writer.object_key().to_string();
    assert!(key.starts_with("users/"));
    assert!(key.ends_with(".parquet"));

    writer.write(Uuid::new_v4(), &record("alice")).unwrap();
    assert_eq!(writer.object_key(), key);
}

#[tokio::test]
async fn test_rows_written_tracks_writes() {
    let temp = tempdir().unwrap();
    let sink = CloudSink::parse(temp.path().to_str().unwrap()).unwrap();
    let mut writer = open_writer(&sink).await;

    assert_eq!(writer.rows_written(), 0);
    writer.write(Uuid::new_v4(), &record("alice")).unwrap();
    writer.write(Uuid::new_v4(), &record("bob")).unwrap();
    assert_eq!(writer.rows_written(), 2);
}
