//! Core data types flowing through the orchestrator.

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::resilience::{ClassifiedError, ErrorKind};
use crate::state_machine::TagState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Shared input handed to every module in a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationInput {
    /// Who or what the computation is about; must not be blank
    pub subject: String,
    pub question: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Request-scoped; not part of the cache fingerprint
    pub requested_at: DateTime<Utc>,
}

impl ComputationInput {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            question: None,
            attributes: BTreeMap::new(),
            requested_at: Utc::now(),
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.subject.trim().is_empty() {
            return Err(OrchestratorError::invalid_input(
                "subject",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Dispatch tags through the bounded executor instead of one at a time
    pub parallel: bool,
    pub use_cache: bool,
    /// Tags to run first, in this order; tags not requested are ignored
    pub priority: Option<Vec<String>>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            use_cache: true,
            priority: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationRequest {
    pub requested_tags: Vec<String>,
    pub input: ComputationInput,
    #[serde(default)]
    pub options: ExecutionOptions,
}

impl ComputationRequest {
    /// Build a request; duplicate tags keep their first occurrence
    pub fn new<I, S>(tags: I, input: ComputationInput) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let requested_tags = tags
            .into_iter()
            .map(Into::into)
            .filter(|tag: &String| seen.insert(tag.clone()))
            .collect();

        Self {
            requested_tags,
            input,
            options: ExecutionOptions::default(),
        }
    }

    pub fn sequential(mut self) -> Self {
        self.options.parallel = false;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.options.use_cache = false;
        self
    }

    pub fn with_priority<I, S>(mut self, priority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.priority = Some(priority.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    Provider,
    /// The static default substituted after the provider failed
    Default,
}

/// Time-stamped snapshot shared read-only by every module in one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentContext {
    pub snapshot_id: Uuid,
    pub fetched_at: DateTime<Utc>,
    pub source: ContextSource,
    pub data: Value,
}

impl EnvironmentContext {
    pub fn new(data: Value) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            fetched_at: Utc::now(),
            source: ContextSource::Provider,
            data,
        }
    }

    pub fn static_default() -> Self {
        Self {
            snapshot_id: Uuid::nil(),
            fetched_at: Utc::now(),
            source: ContextSource::Default,
            data: json!({ "default": true }),
        }
    }

    pub fn is_default(&self) -> bool {
        self.source == ContextSource::Default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Recovered,
    Fallback,
}

/// Marker attached to degraded results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultError {
    pub kind: ErrorKind,
    pub reason: String,
}

impl From<&ClassifiedError> for ResultError {
    fn from(error: &ClassifiedError) -> Self {
        Self {
            kind: error.kind,
            reason: error.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationResult {
    pub type_tag: String,
    /// Always a JSON object
    pub payload: Value,
    pub status: ResultStatus,
    pub error: Option<ResultError>,
    pub generated_at: DateTime<Utc>,
}

impl ComputationResult {
    pub fn success(type_tag: impl Into<String>, payload: Value) -> Self {
        Self::build(type_tag, payload, ResultStatus::Success, None)
    }

    /// A result obtained by recovery; `error` is the failure it recovered from
    pub fn recovered(type_tag: impl Into<String>, payload: Value, error: &ClassifiedError) -> Self {
        Self::build(type_tag, payload, ResultStatus::Recovered, Some(error.into()))
    }

    pub fn fallback(type_tag: impl Into<String>, payload: Value, error: &ClassifiedError) -> Self {
        Self::build(type_tag, payload, ResultStatus::Fallback, Some(error.into()))
    }

    fn build(
        type_tag: impl Into<String>,
        payload: Value,
        status: ResultStatus,
        error: Option<ResultError>,
    ) -> Self {
        Self {
            type_tag: type_tag.into(),
            payload,
            status,
            error,
            generated_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    pub fn is_fallback(&self) -> bool {
        self.status == ResultStatus::Fallback
    }
}

/// What a module may return; normalized into a JSON object payload
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleOutput {
    Structured(Map<String, Value>),
    Text(String),
    Numeric(f64),
    Sequence(Vec<Value>),
}

impl ModuleOutput {
    pub fn normalize(self) -> Value {
        match self {
            Self::Structured(map) => Value::Object(map),
            Self::Text(text) => json!({ "text": text }),
            Self::Numeric(value) => json!({ "value": value }),
            Self::Sequence(items) => json!({ "items": items }),
        }
    }
}

impl From<Value> for ModuleOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Structured(map),
            Value::String(text) => Self::Text(text),
            Value::Array(items) => Self::Sequence(items),
            Value::Number(number) => match number.as_f64() {
                Some(value) => Self::Numeric(value),
                None => Self::Text(number.to_string()),
            },
            other => Self::Text(other.to_string()),
        }
    }
}

/// Final state of one requested tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagOutcome {
    pub type_tag: String,
    pub state: TagState,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    pub request_id: Uuid,
    pub total_time: Duration,
    pub execution_order: Vec<String>,
    pub context: Arc<EnvironmentContext>,
    pub cache_hits: Vec<String>,
    pub tag_states: Vec<TagOutcome>,
    pub fallback_count: usize,
    pub recovered_count: usize,
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationResponse {
    /// One result per requested tag, in execution order
    pub results: Vec<ComputationResult>,
    pub metadata: ExecutionMetadata,
}

impl ComputationResponse {
    pub fn result_for(&self, type_tag: &str) -> Option<&ComputationResult> {
        self.results.iter().find(|result| result.type_tag == type_tag)
    }
}
