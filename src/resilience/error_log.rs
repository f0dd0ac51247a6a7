//! Bounded in-memory log of classified errors.

use super::error_classifier::{ClassifiedError, ErrorKind};
use crate::constants::defaults;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Utc>,
    pub error: ClassifiedError,
    /// Free-form context supplied by the caller (type tag, request id, ...)
    pub context: Value,
}

/// Ring buffer of the most recent classified errors; the oldest entry is dropped
/// when full. Recording never fails.
#[derive(Debug)]
pub struct ErrorLog {
    entries: Mutex<VecDeque<ErrorLogEntry>>,
    capacity: usize,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(defaults::ERROR_LOG_CAPACITY)
    }
}

impl ErrorLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, error: &ClassifiedError, context: Value) {
        warn!(
            error_kind = %error.kind,
            retryable = error.retryable,
            fallback_available = error.fallback_available,
            context = %context,
            "{}",
            error.message
        );

        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(ErrorLogEntry {
            timestamp: Utc::now(),
            error: error.clone(),
            context,
        });
    }

    /// Up to `n` entries, newest first
    pub fn recent(&self, n: usize) -> Vec<ErrorLogEntry> {
        self.entries.lock().iter().rev().take(n).cloned().collect()
    }

    pub fn counts_by_kind(&self) -> BTreeMap<ErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.entries.lock().iter() {
            *counts.entry(entry.error.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
