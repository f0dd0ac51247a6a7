//! Degraded-but-valid results for modules that could not complete.

use super::error_classifier::ClassifiedError;
use crate::orchestration::types::ComputationResult;
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Builds fallback results; never fails
#[derive(Debug, Default)]
pub struct FallbackHandler {
    templates: DashMap<String, Map<String, Value>>,
}

impl FallbackHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the payload to return when `type_tag` falls back
    pub fn register_template(&self, type_tag: impl Into<String>, template: Map<String, Value>) {
        self.templates.insert(type_tag.into(), template);
    }

    pub fn has_template(&self, type_tag: &str) -> bool {
        self.templates.contains_key(type_tag)
    }

    /// Produce the fallback result for `type_tag` after `error`
    pub fn handle(&self, type_tag: &str, error: &ClassifiedError) -> ComputationResult {
        let payload = match self.templates.get(type_tag) {
            Some(template) => {
                let mut payload = template.value().clone();
                payload.insert("fallback".to_string(), Value::Bool(true));
                payload.insert("type_tag".to_string(), json!(type_tag));
                Value::Object(payload)
            }
            None => json!({
                "fallback": true,
                "type_tag": type_tag,
                "message": format!("{type_tag} is temporarily unavailable"),
            }),
        };

        debug!(
            type_tag,
            error_kind = %error.kind,
            templated = self.has_template(type_tag),
            "Serving fallback result"
        );

        ComputationResult::fallback(type_tag, payload, error)
    }
}
