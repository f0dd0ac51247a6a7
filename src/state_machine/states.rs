use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one requested type tag within a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagState {
    /// Tag has been resolved into the execution order but not dispatched
    #[default]
    Pending,
    /// Served from the result cache
    CacheHit,
    /// Module invocation in flight
    Running,
    Succeeded,
    /// Module failed but a recovery strategy produced a result
    Recovered,
    /// Degraded result served by the fallback handler
    Fallback,
}

impl TagState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::CacheHit | Self::Succeeded | Self::Recovered | Self::Fallback
        )
    }
}

impl fmt::Display for TagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::CacheHit => write!(f, "cache_hit"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Recovered => write!(f, "recovered"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

impl std::str::FromStr for TagState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "cache_hit" => Ok(Self::CacheHit),
            "running" => Ok(Self::Running),
            "succeeded" => Ok(Self::Succeeded),
            "recovered" => Ok(Self::Recovered),
            "fallback" => Ok(Self::Fallback),
            _ => Err(format!("Invalid tag state: {s}")),
        }
    }
}
