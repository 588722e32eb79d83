//! Field name normalizer

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::collections::HashMap;

/// Maps arbitrary input field names to names legal in the target encoding.
///
/// Legal names contain only ASCII alphanumerics and underscores and never
/// begin with a digit. The mapping is owned by one writer instance, built
/// incrementally on first sight of each name, and append-only: a name is
/// never re-mapped for the lifetime of the normalizer.
#[derive(Debug, Default)]
pub struct FieldNameNormalizer {
    /// original name -> normalized name
    mapping: HashMap<String, String>,
    /// normalized name -> original name, for collision detection
    claimed: HashMap<String, String>,
}

impl FieldNameNormalizer {
    /// Create an empty normalizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a single field name.
    ///
    /// Deterministic per instance: the same original name always yields the
    /// same result, and repeat lookups have no side effect. Two distinct
    /// originals normalizing to the same legal name raise
    /// [`Error::NameCollision`] rather than being silently merged.
    pub fn normalize(&mut self, name: &str) -> Result<String> {
        if let Some(normalized) = self.mapping.get(name) {
            return Ok(normalized.clone());
        }

        let normalized = legalize(name);
        if let Some(existing) = self.claimed.get(&normalized) {
            return Err(Error::name_collision(name, existing.clone(), normalized));
        }

        self.mapping.insert(name.to_string(), normalized.clone());
        self.claimed.insert(normalized.clone(), name.to_string());
        Ok(normalized)
    }

    /// Normalize every key in a JSON value, recursing through nested objects
    /// and list elements.
    pub fn normalize_keys(&mut self, value: &JsonValue) -> Result<JsonValue> {
        match value {
            JsonValue::Object(obj) => {
                let mut out = JsonObject::new();
                for (key, val) in obj {
                    let normalized = self.normalize(key)?;
                    out.insert(normalized, self.normalize_keys(val)?);
                }
                Ok(JsonValue::Object(out))
            }
            JsonValue::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.normalize_keys(item)?);
                }
                Ok(JsonValue::Array(out))
            }
            other => Ok(other.clone()),
        }
    }

    /// Read-only snapshot of the original -> normalized mapping
    pub fn mapping(&self) -> &HashMap<String, String> {
        &self.mapping
    }

    /// Whether any name seen so far was actually changed by normalization
    pub fn has_renames(&self) -> bool {
        self.mapping.iter().any(|(orig, norm)| orig != norm)
    }
}

/// Rewrite a name so it is legal in the target encoding.
///
/// Illegal characters become underscores; a leading digit gets an underscore
/// prefix; an empty name becomes a single underscore.
fn legalize(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }

    let mut out = String::with_capacity(name.len() + 1);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if i == 0 && c.is_ascii_digit() {
                out.push('_');
            }
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}
