//! Record encoding
//!
//! Converts one loosely-typed JSON record into a value shaped exactly like
//! the declared Arrow schema, injecting the system columns and failing loudly
//! on anything the schema cannot represent.

mod encoder;

pub use encoder::{EncodedRecord, RecordEncoder};

#[cfg(test)]
mod tests;
