//! Columnar writing
//!
//! Buffers encoded records and serializes them into a single Parquet byte
//! stream with configurable compression, row-group and page parameters.
//! Finalize produces the finished file bytes; abort discards them.

mod batch;
mod parquet;

pub use batch::records_to_batch;
pub use parquet::{ColumnarWriter, CompressionCodec, ParquetWriterConfig};
