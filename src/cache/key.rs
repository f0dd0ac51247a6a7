//! Cache keys and input fingerprinting.
//!
//! The fingerprint is a SHA-256 digest over length-prefixed canonical fields of
//! a [`ComputationInput`]. Request-scoped metadata such as `requested_at` is not
//! part of it, so two logically equal inputs always share a key.

use crate::orchestration::types::ComputationInput;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub type_tag: String,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(type_tag: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            fingerprint: fingerprint.into(),
        }
    }

    /// Key for running `type_tag` against `input`
    pub fn for_input(type_tag: &str, input: &ComputationInput) -> Self {
        Self::new(type_tag, fingerprint(input))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_tag, self.fingerprint)
    }
}

/// Stable hex digest of the canonical subset of `input`
pub fn fingerprint(input: &ComputationInput) -> String {
    let mut hasher = Sha256::new();

    write_field(&mut hasher, input.subject.trim().as_bytes());
    match &input.question {
        Some(question) => {
            hasher.update([1u8]);
            write_field(&mut hasher, question.trim().as_bytes());
        }
        None => hasher.update([0u8]),
    }

    hasher.update((input.attributes.len() as u64).to_be_bytes());
    for (name, value) in &input.attributes {
        write_field(&mut hasher, name.as_bytes());
        let mut canonical = String::new();
        write_canonical(value, &mut canonical);
        write_field(&mut hasher, canonical.as_bytes());
    }

    hex::encode(hasher.finalize())
}

fn write_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

// Objects are written with sorted keys regardless of how serde_json stores them.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (index, key) in keys.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(inner) = map.get(key) {
                    write_canonical(inner, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;

    #[test]
    fn test_fingerprint_ignores_request_timestamp() {
        let first = ComputationInput::new("Ada").with_question("What next?");
        let mut second = first.clone();
        second.requested_at = Utc::now() + ChronoDuration::hours(1);

        assert_eq!(fingerprint(&first), fingerprint(&second));
    }

    #[test]
    fn test_fingerprint_trims_subject() {
        let padded = ComputationInput::new("  Ada ");
        let plain = ComputationInput::new("Ada");
        assert_eq!(fingerprint(&padded), fingerprint(&plain));
    }

    #[test]
    fn test_fingerprint_distinguishes_fields() {
        let base = ComputationInput::new("Ada");
        let with_question = base.clone().with_question("");
        let with_attr = base.clone().with_attribute("birth_year", json!(1815));

        assert_ne!(fingerprint(&base), fingerprint(&with_question));
        assert_ne!(fingerprint(&base), fingerprint(&with_attr));

        // length prefixing keeps field boundaries unambiguous
        let split_a = ComputationInput::new("ab").with_question("c");
        let split_b = ComputationInput::new("a").with_question("bc");
        assert_ne!(fingerprint(&split_a), fingerprint(&split_b));
    }

    #[test]
    fn test_nested_attribute_key_order_is_irrelevant() {
        let mut first = serde_json::Map::new();
        first.insert("z".to_string(), json!(1));
        first.insert("a".to_string(), json!({"y": 2, "b": [1, 2]}));
        let mut second = serde_json::Map::new();
        second.insert("a".to_string(), json!({"b": [1, 2], "y": 2}));
        second.insert("z".to_string(), json!(1));

        let left = ComputationInput::new("Ada").with_attribute("chart", Value::Object(first));
        let right = ComputationInput::new("Ada").with_attribute("chart", Value::Object(second));
        assert_eq!(fingerprint(&left), fingerprint(&right));
    }

    #[test]
    fn test_cache_key_display() {
        let key = CacheKey::new("tarot", "abc123");
        assert_eq!(key.to_string(), "tarot:abc123");

        let input = ComputationInput::new("Ada");
        let key = CacheKey::for_input("tarot", &input);
        assert_eq!(key.fingerprint.len(), 64);
        assert_eq!(key.type_tag, "tarot");
    }
}
