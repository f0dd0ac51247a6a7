//! # Orchestrator
//!
//! Top-level coordinator. For each request it resolves the execution order,
//! fetches the environment context once (with retry, substituting the static
//! default on exhaustion), runs every tag through the [`TagPipeline`] either
//! through the bounded executor or one at a time, and aggregates the results in
//! resolved order.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use augur_core::orchestration::{
//!     ComputationInput, ComputationRequest, ModuleRegistry, Orchestrator,
//!     StaticEnvironmentProvider,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ModuleRegistry::new());
//! // registry.register(Arc::new(MyModule))?;
//! let provider = Arc::new(StaticEnvironmentProvider::default());
//! let orchestrator = Orchestrator::new(registry, provider)?;
//!
//! let request = ComputationRequest::new(["tarot", "astrology"], ComputationInput::new("Ada"));
//! let response = orchestrator.execute(request).await?;
//! for result in &response.results {
//!     println!("{} -> {:?}", result.type_tag, result.status);
//! }
//! # Ok(())
//! # }
//! ```

use crate::cache::{CacheMetrics, CacheStats, ResultCache};
use crate::config::AugurConfig;
use crate::constants::metrics;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::execution::BoundedExecutor;
use crate::logging::{log_error, log_request_operation};
use crate::monitoring::{PerformanceMonitor, PerformanceStats};
use crate::orchestration::context::EnvironmentProvider;
use crate::orchestration::execution_order::resolve_execution_order;
use crate::orchestration::pipeline::{PipelineOutcome, TagJob, TagPipeline};
use crate::orchestration::registry::ModuleRegistry;
use crate::orchestration::types::{
    ComputationRequest, ComputationResponse, ComputationResult, EnvironmentContext,
    ExecutionMetadata, ResultStatus, TagOutcome,
};
use crate::resilience::{
    ClassifiedError, ErrorClassifier, ErrorKind, ErrorLog, ErrorLogEntry, ErrorOrigin,
    FallbackHandler, RecoveryManager, RetryHandler, StandardErrorClassifier,
};
use crate::state_machine::TagState;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Aggregate snapshot of the orchestrator's runtime state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorHealth {
    pub registered_modules: Vec<String>,
    pub max_concurrency: usize,
    pub active_tasks: usize,
    pub queued_tasks: usize,
    pub cache: CacheMetrics,
    pub error_counts: BTreeMap<ErrorKind, usize>,
    pub performance: BTreeMap<String, PerformanceStats>,
}

pub struct Orchestrator {
    config: AugurConfig,
    registry: Arc<ModuleRegistry>,
    provider: Arc<dyn EnvironmentProvider>,
    executor: BoundedExecutor,
    retry: RetryHandler,
    pipeline: TagPipeline,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("provider", &self.provider.provider_name())
            .field("executor", &self.executor)
            .field("config", &self.config)
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator with default configuration
    pub fn new(
        registry: Arc<ModuleRegistry>,
        provider: Arc<dyn EnvironmentProvider>,
    ) -> OrchestratorResult<Self> {
        Self::with_config(AugurConfig::default(), registry, provider)
    }

    pub fn with_config(
        config: AugurConfig,
        registry: Arc<ModuleRegistry>,
        provider: Arc<dyn EnvironmentProvider>,
    ) -> OrchestratorResult<Self> {
        config.validate()?;
        let executor = BoundedExecutor::new(config.orchestrator.max_concurrency)?;
        let classifier: Arc<dyn ErrorClassifier> = Arc::new(StandardErrorClassifier::new());

        let pipeline = TagPipeline {
            cache: Arc::new(ResultCache::new(config.cache.clone())),
            monitor: Arc::new(PerformanceMonitor::with_window(config.monitoring.window_size)),
            classifier: Arc::clone(&classifier),
            error_log: Arc::new(ErrorLog::new(config.error_log.capacity)),
            recovery: RecoveryManager::from_config(&config.orchestrator),
            fallback: Arc::new(FallbackHandler::new()),
            module_timeout: config.orchestrator.module_timeout(),
        };

        info!(
            modules = registry.len(),
            max_concurrency = config.orchestrator.max_concurrency,
            module_timeout_ms = config.orchestrator.module_timeout_ms,
            provider = provider.provider_name(),
            "Orchestrator created"
        );

        Ok(Self {
            config,
            registry,
            provider,
            executor,
            retry: RetryHandler::new(classifier),
            pipeline,
        })
    }

    /// Replace the error classifier used for module and context failures
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.retry = RetryHandler::new(Arc::clone(&classifier));
        self.pipeline.classifier = classifier;
        self
    }

    pub fn config(&self) -> &AugurConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Register per-tag fallback payload templates here
    pub fn fallback_handler(&self) -> &FallbackHandler {
        &self.pipeline.fallback
    }

    /// Run every requested tag and aggregate the results.
    ///
    /// Fails only for request-level problems: an empty tag set, an unknown tag
    /// or an invalid input. Individual module failures become degraded results.
    #[instrument(
        skip(self, request),
        fields(request_id = tracing::field::Empty, tags = request.requested_tags.len())
    )]
    pub async fn execute(
        &self,
        request: ComputationRequest,
    ) -> OrchestratorResult<ComputationResponse> {
        let started = Instant::now();
        self.validate_request(&request)?;

        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));
        let request_label = request_id.to_string();
        log_request_operation(
            "execute",
            Some(&request_label),
            request.requested_tags.len(),
            "started",
            None,
        );

        let ComputationRequest {
            requested_tags,
            input,
            options,
        } = request;

        let execution_order = resolve_execution_order(
            &requested_tags,
            options.priority.as_deref(),
            &self.registry.type_tags(),
        );

        let context = Arc::new(self.fetch_context(request_id).await);
        let input = Arc::new(input);

        let mut jobs = Vec::with_capacity(execution_order.len());
        for type_tag in &execution_order {
            let module = self
                .registry
                .get(type_tag)
                .ok_or_else(|| OrchestratorError::UnknownTypeTag {
                    tag: type_tag.clone(),
                })?;
            jobs.push(TagJob {
                request_id,
                type_tag: type_tag.clone(),
                module,
                input: Arc::clone(&input),
                context: Arc::clone(&context),
                use_cache: options.use_cache,
            });
        }

        let outcomes = if options.parallel {
            self.run_parallel(jobs, request_id).await
        } else {
            self.run_sequential(jobs).await
        };

        let mut results = Vec::with_capacity(outcomes.len());
        let mut cache_hits = Vec::new();
        let mut tag_states = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if outcome.cache_hit() {
                cache_hits.push(outcome.result.type_tag.clone());
            }
            tag_states.push(TagOutcome {
                type_tag: outcome.result.type_tag.clone(),
                state: outcome.state,
                duration_ms: outcome.duration.as_millis() as u64,
            });
            results.push(outcome.result);
        }

        let fallback_count = count_status(&results, ResultStatus::Fallback);
        let recovered_count = count_status(&results, ResultStatus::Recovered);
        let total_time = started.elapsed();
        self.pipeline.monitor.record(metrics::EXECUTE, total_time);

        log_request_operation(
            "execute",
            Some(&request_label),
            results.len(),
            "completed",
            Some(&format!(
                "cache_hits={} fallbacks={} recovered={} total_ms={}",
                cache_hits.len(),
                fallback_count,
                recovered_count,
                total_time.as_millis()
            )),
        );

        Ok(ComputationResponse {
            results,
            metadata: ExecutionMetadata {
                request_id,
                total_time,
                execution_order,
                context,
                cache_hits,
                tag_states,
                fallback_count,
                recovered_count,
                parallel: options.parallel,
            },
        })
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.pipeline.cache.metrics()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.pipeline.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.pipeline.cache.clear();
    }

    /// Drop cached results for one type tag
    pub fn invalidate_tag(&self, type_tag: &str) -> usize {
        self.pipeline.cache.invalidate_tag(type_tag)
    }

    pub fn performance_stats(&self) -> BTreeMap<String, PerformanceStats> {
        self.pipeline.monitor.all_stats()
    }

    /// Up to `n` logged errors, newest first
    pub fn recent_errors(&self, n: usize) -> Vec<ErrorLogEntry> {
        self.pipeline.error_log.recent(n)
    }

    pub fn health(&self) -> OrchestratorHealth {
        OrchestratorHealth {
            registered_modules: self.registry.type_tags(),
            max_concurrency: self.executor.max_concurrency(),
            active_tasks: self.executor.active(),
            queued_tasks: self.executor.queued(),
            cache: self.pipeline.cache.metrics(),
            error_counts: self.pipeline.error_log.counts_by_kind(),
            performance: self.pipeline.monitor.all_stats(),
        }
    }

    fn validate_request(&self, request: &ComputationRequest) -> OrchestratorResult<()> {
        if request.requested_tags.is_empty() {
            return Err(OrchestratorError::EmptyRequest);
        }

        if let Some(unknown) = request
            .requested_tags
            .iter()
            .find(|tag| !self.registry.contains(tag))
        {
            return Err(OrchestratorError::UnknownTypeTag {
                tag: unknown.clone(),
            });
        }

        request.input.validate()
    }

    /// Fetch the environment once; the static default replaces it after retries run out
    async fn fetch_context(&self, request_id: Uuid) -> EnvironmentContext {
        let timer = self.pipeline.monitor.start(metrics::CONTEXT_FETCH);
        let fetched = self
            .retry
            .with_retry(
                metrics::CONTEXT_FETCH,
                ErrorOrigin::ContextFetch,
                &self.config.context_retry,
                |_| self.provider.fetch(),
            )
            .await;
        timer.stop();

        match fetched {
            Ok(context) => context,
            Err(error) => {
                self.pipeline.error_log.record(
                    &error,
                    json!({
                        "request_id": request_id.to_string(),
                        "stage": "context_fetch",
                        "provider": self.provider.provider_name(),
                    }),
                );
                warn!(
                    %request_id,
                    error_kind = %error.kind,
                    "Environment fetch failed; substituting static default context"
                );
                EnvironmentContext::static_default()
            }
        }
    }

    async fn run_sequential(&self, jobs: Vec<TagJob>) -> Vec<PipelineOutcome> {
        let mut outcomes = Vec::with_capacity(jobs.len());
        for job in jobs {
            outcomes.push(self.pipeline.run(job).await);
        }
        outcomes
    }

    async fn run_parallel(&self, jobs: Vec<TagJob>, request_id: Uuid) -> Vec<PipelineOutcome> {
        let type_tags: Vec<String> = jobs.iter().map(|job| job.type_tag.clone()).collect();
        let tasks = jobs.into_iter().map(|job| {
            let pipeline = self.pipeline.clone();
            async move { pipeline.run(job).await }
        });

        self.executor
            .execute_all(tasks)
            .await
            .into_iter()
            .zip(type_tags)
            .map(|(slot, type_tag)| match slot {
                Ok(outcome) => outcome,
                Err(executor_error) => {
                    // pipeline task panicked or was cancelled
                    let error = ClassifiedError::new(ErrorKind::Unknown, executor_error.to_string());
                    log_error(
                        "orchestrator",
                        "execute",
                        &error.message,
                        Some(type_tag.as_str()),
                    );
                    self.pipeline.error_log.record(
                        &error,
                        json!({
                            "request_id": request_id.to_string(),
                            "type_tag": type_tag,
                            "stage": "dispatch",
                        }),
                    );
                    PipelineOutcome {
                        result: self.pipeline.fallback.handle(&type_tag, &error),
                        state: TagState::Fallback,
                        duration: Duration::ZERO,
                    }
                }
            })
            .collect()
    }
}

fn count_status(results: &[ComputationResult], status: ResultStatus) -> usize {
    results.iter().filter(|result| result.status == status).count()
}
