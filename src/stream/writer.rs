//! Per-stream writer lifecycle

use crate::encode::RecordEncoder;
use crate::error::{Error, Result};
use crate::sink::{output_object_key, ObjectSink, ObjectUpload};
use crate::types::{RecordMessage, UnknownFieldPolicy};
use crate::writer::{ColumnarWriter, ParquetWriterConfig};
use arrow::datatypes::SchemaRef;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// File extension of the produced format
const FORMAT_EXTENSION: &str = "parquet";

/// Lifecycle state of a stream writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Accepting writes and exactly one close
    Open,
    /// Closed with a complete, readable destination object
    ClosedSuccess,
    /// Closed after a failure; the destination object is not authoritative
    ClosedFailure,
}

impl WriterState {
    fn as_str(self) -> &'static str {
        match self {
            WriterState::Open => "Open",
            WriterState::ClosedSuccess => "ClosedSuccess",
            WriterState::ClosedFailure => "ClosedFailure",
        }
    }
}

/// A per-stream destination writer.
///
/// `write` calls are sequential and non-reentrant for one instance; distinct
/// instances share nothing and may run fully concurrently.
#[async_trait]
pub trait StreamWriter: Send {
    /// Write one record. Only valid while the writer is open.
    ///
    /// The id hint identifies the record upstream; the persisted record id is
    /// generated fresh regardless.
    fn write(&mut self, id: Uuid, record: &RecordMessage) -> Result<()>;

    /// Terminal transition, valid exactly once.
    ///
    /// `has_failed = false` finalizes and commits the destination object;
    /// `has_failed = true` aborts, discarding the upload best-effort.
    async fn close(&mut self, has_failed: bool) -> Result<()>;
}

/// Parquet implementation of [`StreamWriter`].
///
/// The destination key is computed once at open from the stream name and a
/// fixed upload timestamp, so every record of this instance lands in exactly
/// one object.
pub struct ParquetStreamWriter {
    stream_name: String,
    object_key: String,
    destination: String,
    encoder: RecordEncoder,
    writer: Option<ColumnarWriter>,
    upload: Box<dyn ObjectUpload>,
    state: WriterState,
}

impl ParquetStreamWriter {
    /// Open a writer for one stream under a resolved schema.
    ///
    /// Validates the writer config, computes the destination key and opens
    /// the upload. The schema must carry the system columns (see
    /// [`RecordEncoder::new`]).
    pub async fn open(
        sink: &dyn ObjectSink,
        stream_name: impl Into<String>,
        schema: SchemaRef,
        config: &ParquetWriterConfig,
        policy: UnknownFieldPolicy,
    ) -> Result<Self> {
        let stream_name = stream_name.into();
        let uploaded_at = Utc::now();
        let object_key = output_object_key(&stream_name, uploaded_at, FORMAT_EXTENSION);
        let destination = sink.describe(&object_key);

        tracing::info!(
            stream = %stream_name,
            destination = %destination,
            "Opening stream writer"
        );

        let encoder = RecordEncoder::new(Arc::clone(&schema), policy)?;
        let writer = ColumnarWriter::new(schema, config)?;
        let upload = sink.open(&object_key).await?;

        Ok(Self {
            stream_name,
            object_key,
            destination,
            encoder,
            writer: Some(writer),
            upload,
            state: WriterState::Open,
        })
    }

    /// Name of the stream this writer serves
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Destination key, fixed at open
    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    /// Current lifecycle state
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Rows accepted so far
    pub fn rows_written(&self) -> usize {
        self.writer.as_ref().map_or(0, ColumnarWriter::rows_written)
    }

    /// Snapshot of the original -> normalized field name mapping
    pub fn field_name_mapping(&self) -> &HashMap<String, String> {
        self.encoder.field_name_mapping()
    }
}

#[async_trait]
impl StreamWriter for ParquetStreamWriter {
    fn write(&mut self, _id: Uuid, record: &RecordMessage) -> Result<()> {
        if self.state != WriterState::Open {
            return Err(Error::invalid_state("write", self.state.as_str()));
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::invalid_state("write", self.state.as_str()))?;

        let encoded = self.encoder.encode(record)?;
        writer.write(encoded)
    }

    async fn close(&mut self, has_failed: bool) -> Result<()> {
        if self.state != WriterState::Open {
            return Err(Error::AlreadyClosed {
                stream: self.stream_name.clone(),
            });
        }
        let writer = self.writer.take().ok_or_else(|| Error::AlreadyClosed {
            stream: self.stream_name.clone(),
        })?;

        if has_failed {
            tracing::warn!(
                stream = %self.stream_name,
                "Failure detected. Aborting upload of stream"
            );
            self.state = WriterState::ClosedFailure;
            writer.abort();
            // Discard is best-effort cleanup; a failure here must not mask
            // that the run itself failed.
            if let Err(e) = self.upload.discard().await {
                tracing::warn!(
                    stream = %self.stream_name,
                    error = %e,
                    "Failed to discard aborted upload"
                );
            }
            tracing::warn!(stream = %self.stream_name, "Upload of stream aborted");
            return Ok(());
        }

        // A failed finalize must not leave the writer reopenable.
        self.state = WriterState::ClosedFailure;

        tracing::info!(stream = %self.stream_name, "Uploading remaining data for stream");
        let rows = writer.rows_written();
        let bytes = writer.finalize()?;
        self.upload.write(bytes).await?;
        self.upload.commit().await?;
        self.state = WriterState::ClosedSuccess;

        tracing::info!(
            stream = %self.stream_name,
            destination = %self.destination,
            rows,
            "Upload completed for stream"
        );
        Ok(())
    }
}
