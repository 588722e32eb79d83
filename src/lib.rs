//! # streamsink
//!
//! A minimal, Rust-native toolkit for landing record streams in columnar
//! object storage.
//!
//! ## Features
//!
//! - **Schema-bound encoding**: loosely-typed JSON records are matched
//!   strictly against a declared Arrow schema, never silently coerced
//! - **Field name normalization**: arbitrary upstream names become legal
//!   column names, with the mapping exposed for reverse lookup
//! - **Parquet output**: compression, row-group and page tuning per stream
//! - **Cloud destinations**: S3, R2, GCS, Azure or local files via one URL
//! - **Explicit finalization**: success commits a complete object, failure
//!   aborts and leaves nothing authoritative
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use streamsink::{
//!     CloudSink, ParquetStreamWriter, ParquetWriterConfig, RecordMessage,
//!     StreamWriter, UnknownFieldPolicy,
//! };
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> streamsink::Result<()> {
//!     let sink = CloudSink::parse("s3://my-bucket/landing/")?;
//!     let mut writer = ParquetStreamWriter::open(
//!         &sink,
//!         "users",
//!         schema, // resolved Arrow schema with the system columns
//!         &ParquetWriterConfig::default(),
//!         UnknownFieldPolicy::Drop,
//!     )
//!     .await?;
//!
//!     for record in records {
//!         writer.write(Uuid::new_v4(), &record)?;
//!     }
//!     writer.close(false).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! raw JSON record
//!       │
//!       ▼
//! ┌───────────────┐   ┌────────────────┐   ┌─────────────────┐
//! │ Field Name    │──▶│ Record Encoder │──▶│ Columnar Writer │
//! │ Normalizer    │   │ (schema-bound) │   │ (Parquet bytes) │
//! └───────────────┘   └────────────────┘   └────────┬────────┘
//!                                                   │ close(success|failure)
//!                                                   ▼
//!                                          ┌─────────────────┐
//!                                          │   Object Sink   │
//!                                          │ commit / discard│
//!                                          └─────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::match_same_arms)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Field name normalization
pub mod naming;

/// Schema-bound record encoding
pub mod encode;

/// Buffered Parquet writing
pub mod writer;

/// Object store sinks
pub mod sink;

/// Per-stream writer lifecycle
pub mod stream;

/// Configuration and schema specs
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{DestinationConfig, FieldSpec, FieldType, SchemaSpec};
pub use encode::{EncodedRecord, RecordEncoder};
pub use error::{Error, Result};
pub use naming::FieldNameNormalizer;
pub use sink::{output_object_key, CloudSink, ObjectSink, ObjectUpload};
pub use stream::{ParquetStreamWriter, StreamWriter, WriterState};
pub use types::{
    JsonObject, JsonValue, RecordMessage, UnknownFieldPolicy, COLUMN_NAME_EMITTED_AT,
    COLUMN_NAME_RECORD_ID,
};
pub use writer::{ColumnarWriter, CompressionCodec, ParquetWriterConfig};
