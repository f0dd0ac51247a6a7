//! # Per-Tag Pipeline
//!
//! Runs one requested type tag to completion:
//!
//! ```text
//! cache lookup ──hit──▶ CACHE_HIT
//!      │miss
//!      ▼
//! invoke (timeout) ──ok──▶ normalize ─▶ cache store ─▶ SUCCEEDED
//!      │err
//!      ▼
//! classify ─▶ log ─▶ recovery ──ok──▶ RECOVERED
//!                        │none
//!                        ▼
//!                    fallback ─▶ FALLBACK
//! ```
//!
//! The pipeline never returns an error; every path ends in a result.

use crate::cache::{CacheKey, ResultCache};
use crate::constants::metrics;
use crate::logging::log_module_operation;
use crate::monitoring::PerformanceMonitor;
use crate::orchestration::registry::{invoke_with_timeout, ComputationModule};
use crate::orchestration::types::{ComputationInput, ComputationResult, EnvironmentContext};
use crate::resilience::{
    ClassifiedError, ErrorClassifier, ErrorLog, ErrorOrigin, FallbackHandler, RecoveryContext,
    RecoveryManager,
};
use crate::state_machine::{TagEvent, TagState, TagStateMachine};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;
use uuid::Uuid;

/// Everything needed to run one tag; owned so it can move into a spawned task
pub struct TagJob {
    pub request_id: Uuid,
    pub type_tag: String,
    pub module: Arc<dyn ComputationModule>,
    pub input: Arc<ComputationInput>,
    pub context: Arc<EnvironmentContext>,
    pub use_cache: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub result: ComputationResult,
    pub state: TagState,
    pub duration: Duration,
}

impl PipelineOutcome {
    pub fn cache_hit(&self) -> bool {
        self.state == TagState::CacheHit
    }
}

/// Shared collaborators of every pipeline run; cheap to clone
#[derive(Clone)]
pub struct TagPipeline {
    pub(crate) cache: Arc<ResultCache>,
    pub(crate) monitor: Arc<PerformanceMonitor>,
    pub(crate) classifier: Arc<dyn ErrorClassifier>,
    pub(crate) error_log: Arc<ErrorLog>,
    pub(crate) recovery: RecoveryManager,
    pub(crate) fallback: Arc<FallbackHandler>,
    pub(crate) module_timeout: Duration,
}

impl TagPipeline {
    pub async fn run(&self, job: TagJob) -> PipelineOutcome {
        let started = Instant::now();
        let mut machine = TagStateMachine::new(job.type_tag.as_str());
        let key = CacheKey::for_input(&job.type_tag, &job.input);

        if job.use_cache {
            if let Some(cached) = self.cache.get(&key) {
                advance(&mut machine, TagEvent::CacheHit);
                log_module_operation("execute", &job.type_tag, "cache_hit", None, None);
                return outcome(cached, &machine, started);
            }
        }

        advance(&mut machine, TagEvent::Start);
        let timer = self.monitor.start(metrics::module_label(&job.type_tag));
        let invocation = invoke_with_timeout(
            job.module.as_ref(),
            &job.input,
            &job.context,
            self.module_timeout,
        )
        .await;
        let elapsed = timer.stop();

        let error = match invocation {
            Ok(output) => {
                let result = ComputationResult::success(job.type_tag.as_str(), output.normalize());
                if job.use_cache {
                    self.cache.set(key, result.clone());
                }
                advance(&mut machine, TagEvent::Succeed);
                log_module_operation(
                    "execute",
                    &job.type_tag,
                    "succeeded",
                    Some(elapsed.as_millis() as u64),
                    None,
                );
                return outcome(result, &machine, started);
            }
            Err(error) => self.classifier.classify(&error, ErrorOrigin::Module),
        };

        self.error_log.record(
            &error,
            json!({
                "request_id": job.request_id.to_string(),
                "type_tag": job.type_tag,
                "stage": "invoke",
            }),
        );

        if let Some(recovered) = self.recover(&job, &error).await {
            advance(&mut machine, TagEvent::Recover(error.message.clone()));
            log_module_operation(
                "execute",
                &job.type_tag,
                "recovered",
                Some(started.elapsed().as_millis() as u64),
                Some(error.kind.code()),
            );
            return outcome(recovered, &machine, started);
        }

        let result = self.fallback.handle(&job.type_tag, &error);
        advance(&mut machine, TagEvent::Fallback(error.message.clone()));
        log_module_operation(
            "execute",
            &job.type_tag,
            "fallback",
            Some(started.elapsed().as_millis() as u64),
            Some(error.kind.code()),
        );
        outcome(result, &machine, started)
    }

    async fn recover(&self, job: &TagJob, error: &ClassifiedError) -> Option<ComputationResult> {
        for attempt in 1..=self.recovery.max_attempts() {
            let ctx = RecoveryContext {
                type_tag: &job.type_tag,
                input: &job.input,
                context: &job.context,
                attempt,
            };
            if let Some(result) = self
                .recovery
                .attempt_recovery(error, ctx, job.module.as_ref())
                .await
            {
                return Some(result);
            }
        }
        None
    }
}

fn advance(machine: &mut TagStateMachine, event: TagEvent) {
    if let Err(error) = machine.transition(event) {
        warn!(type_tag = machine.type_tag(), error = %error, "Ignoring invalid tag transition");
    }
}

fn outcome(result: ComputationResult, machine: &TagStateMachine, started: Instant) -> PipelineOutcome {
    PipelineOutcome {
        result,
        state: machine.current_state(),
        duration: started.elapsed(),
    }
}
