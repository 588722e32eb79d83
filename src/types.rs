//! Common types used throughout streamsink
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use chrono::Utc;
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// System Columns
// ============================================================================

/// Column holding the per-record identifier, generated fresh on every write.
pub const COLUMN_NAME_RECORD_ID: &str = "_record_id";

/// Column holding the upstream emission timestamp in epoch milliseconds.
pub const COLUMN_NAME_EMITTED_AT: &str = "_emitted_at";

// ============================================================================
// Record Message
// ============================================================================

/// One record as handed over by an upstream reader.
///
/// `data` is an arbitrary JSON-shaped value; `emitted_at` is the upstream
/// emission timestamp in epoch milliseconds and travels with the record into
/// the destination as [`COLUMN_NAME_EMITTED_AT`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMessage {
    /// Name of the logical stream this record belongs to
    pub stream: String,
    /// The record payload
    pub data: JsonValue,
    /// Emission timestamp in epoch milliseconds
    pub emitted_at: i64,
}

impl RecordMessage {
    /// Create a new record message
    pub fn new(stream: impl Into<String>, data: JsonValue, emitted_at: i64) -> Self {
        Self {
            stream: stream.into(),
            data,
            emitted_at,
        }
    }

    /// Create a record message emitted now
    pub fn emitted_now(stream: impl Into<String>, data: JsonValue) -> Self {
        Self::new(stream, data, Utc::now().timestamp_millis())
    }
}

// ============================================================================
// Unknown Field Policy
// ============================================================================

/// What to do with input fields that are not part of the declared schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Silently omit unknown fields (upstream sources often attach extra
    /// metadata that the declared schema does not carry)
    #[default]
    Drop,
    /// Fail the record with an `UnknownField` error
    Fail,
}
