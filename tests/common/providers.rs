use anyhow::anyhow;
use async_trait::async_trait;
use augur_core::orchestration::{EnvironmentContext, EnvironmentProvider};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};

/// Fails the first `failures` fetches, then returns a fresh snapshot
#[derive(Debug)]
pub struct FlakyProvider {
    failures: u32,
    message: &'static str,
    calls: AtomicU32,
}

impl FlakyProvider {
    pub fn new(failures: u32) -> Self {
        Self {
            failures,
            message: "ephemeris service unavailable",
            calls: AtomicU32::new(0),
        }
    }

    /// Never succeeds
    pub fn always_failing() -> Self {
        Self::new(u32::MAX)
    }

    /// Never succeeds, always reporting a gateway timeout
    pub fn timing_out() -> Self {
        Self {
            message: "ephemeris gateway timeout",
            ..Self::always_failing()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnvironmentProvider for FlakyProvider {
    async fn fetch(&self) -> anyhow::Result<EnvironmentContext> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(anyhow!(self.message))
        } else {
            Ok(EnvironmentContext::new(json!({ "moon": "full" })))
        }
    }

    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}
