//! Eviction strategies for the result cache.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Victim selection policy applied when the cache is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Evict the least recently accessed entry
    #[default]
    Lru,
    /// Evict the entry with the fewest accesses, oldest access first on ties
    Lfu,
    /// Evict the oldest inserted entry
    Fifo,
}

impl EvictionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lru => "lru",
            Self::Lfu => "lfu",
            Self::Fifo => "fifo",
        }
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            "fifo" => Ok(Self::Fifo),
            other => Err(format!("Unknown eviction strategy: {other}")),
        }
    }
}

/// Ordering facts the strategies choose between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EvictionCandidate {
    /// Monotonic sequence number of the insertion
    pub inserted_seq: u64,
    /// Monotonic sequence number of the most recent access (or insertion)
    pub accessed_seq: u64,
    pub access_count: u64,
}

impl EvictionStrategy {
    /// Pick the victim among `candidates`, returning its key
    pub(crate) fn select_victim<'a, K, I>(&self, candidates: I) -> Option<&'a K>
    where
        I: IntoIterator<Item = (&'a K, EvictionCandidate)>,
        K: 'a,
    {
        let candidates = candidates.into_iter();
        match self {
            Self::Lru => candidates
                .min_by_key(|(_, c)| c.accessed_seq)
                .map(|(key, _)| key),
            Self::Lfu => candidates
                .min_by_key(|(_, c)| (c.access_count, c.accessed_seq))
                .map(|(key, _)| key),
            Self::Fifo => candidates
                .min_by_key(|(_, c)| c.inserted_seq)
                .map(|(key, _)| key),
        }
    }
}
