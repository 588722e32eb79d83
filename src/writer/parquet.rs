//! Buffered Parquet writer
//!
//! Accepts a stream of encoded records and produces a single well-formed
//! Parquet byte stream on finalize. Compression and row-group boundaries are
//! internal; callers only observe the finished bytes.

use crate::encode::EncodedRecord;
use crate::error::{Error, Result};
use crate::writer::records_to_batch;
use arrow::datatypes::SchemaRef;
use bytes::{BufMut, Bytes, BytesMut};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Records per in-memory batch handed to the Arrow writer
const BATCH_ROWS: usize = 1024;

/// Supported compression codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionCodec {
    None,
    #[default]
    Snappy,
    Gzip,
    Zstd,
}

impl From<CompressionCodec> for Compression {
    fn from(codec: CompressionCodec) -> Self {
        match codec {
            CompressionCodec::None => Compression::UNCOMPRESSED,
            CompressionCodec::Snappy => Compression::SNAPPY,
            CompressionCodec::Gzip => Compression::GZIP(GzipLevel::default()),
            CompressionCodec::Zstd => Compression::ZSTD(ZstdLevel::default()),
        }
    }
}

/// Configuration for the Parquet writer
///
/// All knobs are immutable per writer instance and validated at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParquetWriterConfig {
    compression: CompressionCodec,
    row_group_size_bytes: usize,
    max_padding_size_bytes: usize,
    page_size_bytes: usize,
    dictionary_page_size_bytes: usize,
    dictionary_enabled: bool,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: CompressionCodec::Snappy,
            row_group_size_bytes: 128 * 1024 * 1024,
            max_padding_size_bytes: 8 * 1024 * 1024,
            page_size_bytes: 1024 * 1024,
            dictionary_page_size_bytes: 1024 * 1024,
            dictionary_enabled: true,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression codec
    #[must_use]
    pub fn with_compression(mut self, codec: CompressionCodec) -> Self {
        self.compression = codec;
        self
    }

    /// Set target row group size in bytes
    #[must_use]
    pub fn with_row_group_size_bytes(mut self, size: usize) -> Self {
        self.row_group_size_bytes = size;
        self
    }

    /// Set maximum padding size in bytes
    #[must_use]
    pub fn with_max_padding_size_bytes(mut self, size: usize) -> Self {
        self.max_padding_size_bytes = size;
        self
    }

    /// Set target page size in bytes
    #[must_use]
    pub fn with_page_size_bytes(mut self, size: usize) -> Self {
        self.page_size_bytes = size;
        self
    }

    /// Set dictionary page size in bytes
    #[must_use]
    pub fn with_dictionary_page_size_bytes(mut self, size: usize) -> Self {
        self.dictionary_page_size_bytes = size;
        self
    }

    /// Enable or disable dictionary encoding
    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    /// Get the compression codec
    pub fn compression(&self) -> CompressionCodec {
        self.compression
    }

    /// Get the target row group size in bytes
    pub fn row_group_size_bytes(&self) -> usize {
        self.row_group_size_bytes
    }

    /// Get dictionary encoding enabled
    pub fn is_dictionary_enabled(&self) -> bool {
        self.dictionary_enabled
    }

    /// Validate the tuning parameters.
    ///
    /// Each size must be positive where applicable; there is no
    /// cross-validation between knobs.
    pub fn validate(&self) -> Result<()> {
        if self.row_group_size_bytes == 0 {
            return Err(Error::invalid_config(
                "row_group_size_bytes",
                "must be positive",
            ));
        }
        if self.page_size_bytes == 0 {
            return Err(Error::invalid_config("page_size_bytes", "must be positive"));
        }
        if self.dictionary_page_size_bytes == 0 {
            return Err(Error::invalid_config(
                "dictionary_page_size_bytes",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Build parquet writer properties from this config
    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression.into())
            .set_data_page_size_limit(self.page_size_bytes)
            .set_dictionary_page_size_limit(self.dictionary_page_size_bytes)
            .set_dictionary_enabled(self.dictionary_enabled)
            .build()
    }
}

/// A buffer with interior mutability for the ArrowWriter
#[derive(Clone, Debug)]
struct SharedBuffer {
    buffer: Arc<Mutex<bytes::buf::Writer<BytesMut>>>,
}

impl SharedBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(BytesMut::with_capacity(capacity).writer())),
        }
    }

    fn into_inner(self) -> Result<BytesMut> {
        let mutex = Arc::into_inner(self.buffer)
            .ok_or_else(|| Error::sink("parquet buffer still in use"))?;
        let writer = mutex
            .into_inner()
            .map_err(|_| Error::sink("parquet buffer lock poisoned"))?;
        Ok(writer.into_inner())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| std::io::Error::other("parquet buffer lock poisoned"))?;
        Write::write(&mut *buffer, buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Buffered Parquet writer over an in-memory byte buffer.
///
/// `finalize` consumes the writer and returns the finished file bytes, so a
/// second finalize is unrepresentable; `abort` consumes it and drops all
/// buffered data without producing a readable file.
#[derive(Debug)]
pub struct ColumnarWriter {
    schema: SchemaRef,
    writer: ArrowWriter<SharedBuffer>,
    buffer: SharedBuffer,
    pending: Vec<EncodedRecord>,
    rows_written: usize,
    row_group_size_bytes: usize,
}

impl ColumnarWriter {
    /// Create a writer for the given schema and config.
    ///
    /// Invalid tuning parameters are rejected here, not deferred to the
    /// first write.
    pub fn new(schema: SchemaRef, config: &ParquetWriterConfig) -> Result<Self> {
        config.validate()?;

        let buffer = SharedBuffer::new(1024 * 1024);
        let writer = ArrowWriter::try_new(
            buffer.clone(),
            Arc::clone(&schema),
            Some(config.build_properties()),
        )?;

        Ok(Self {
            schema,
            writer,
            buffer,
            pending: Vec::with_capacity(BATCH_ROWS),
            rows_written: 0,
            row_group_size_bytes: config.row_group_size_bytes,
        })
    }

    /// Buffer one encoded record
    pub fn write(&mut self, record: EncodedRecord) -> Result<()> {
        self.pending.push(record);
        if self.pending.len() >= BATCH_ROWS {
            self.flush_pending()?;
        }
        Ok(())
    }

    /// Number of rows accepted so far
    pub fn rows_written(&self) -> usize {
        self.rows_written + self.pending.len()
    }

    /// Flush buffered records into the Arrow writer, cutting a row group
    /// once the in-progress size crosses the configured threshold
    fn flush_pending(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let batch = records_to_batch(&self.schema, &self.pending)?;
        self.writer.write(&batch)?;
        self.rows_written += batch.num_rows();
        self.pending.clear();

        if self.writer.in_progress_size() >= self.row_group_size_bytes {
            self.writer.flush()?;
        }
        Ok(())
    }

    /// Flush everything, write the footer and return the finished file bytes
    pub fn finalize(mut self) -> Result<Bytes> {
        self.flush_pending()?;

        let Self { writer, buffer, .. } = self;
        writer.close()?;
        Ok(buffer.into_inner()?.freeze())
    }

    /// Release buffers without producing a readable file
    pub fn abort(self) {
        drop(self);
    }
}
