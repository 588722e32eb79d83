//! Stream writer lifecycle
//!
//! One writer instance per logical stream: open, write records, then close
//! exactly once with success or failure. Success finalizes and commits the
//! destination object; failure aborts and leaves nothing authoritative.

mod writer;

pub use writer::{ParquetStreamWriter, StreamWriter, WriterState};

#[cfg(test)]
mod tests;
