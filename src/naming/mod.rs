//! Field name normalization
//!
//! Arbitrary upstream field names are not necessarily legal column names in
//! Arrow/Parquet tooling downstream. This module maps every input name to a
//! legal one and keeps the mapping so callers can invert it.

mod normalizer;

pub use normalizer::FieldNameNormalizer;
