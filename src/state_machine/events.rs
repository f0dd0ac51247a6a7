use serde::{Deserialize, Serialize};

/// Events that drive a tag through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TagEvent {
    /// A live cached result was found
    CacheHit,
    /// The module invocation was dispatched
    Start,
    /// The module returned a result
    Succeed,
    /// A recovery strategy produced a result after a failure
    Recover(String),
    /// The fallback handler served a degraded result
    Fallback(String),
}

impl TagEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CacheHit => "cache_hit",
            Self::Start => "start",
            Self::Succeed => "succeed",
            Self::Recover(_) => "recover",
            Self::Fallback(_) => "fallback",
        }
    }
}
