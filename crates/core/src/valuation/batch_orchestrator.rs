use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use tokio::runtime::{Handle, RuntimeFlavor};
use uuid::Uuid;

use super::fingerprint::fingerprint;
use super::progress::{CancellationFlag, ProgressSink};
use super::result_cache::{CacheKey, ResultCacheTrait};
use super::valuation_calculator::ValuationCalculator;
use super::valuation_model::{
    AppraisalParameters, BatchOutcome, BatchTotals, NewAppraisalParameters, NewValuationHistory,
    ValuationHistory, ValuationResult,
};
use super::valuation_traits::ValuationHistoryRepositoryTrait;
use crate::errors::{Error, Result};
use crate::properties::{PropertyRecord, PropertyRepositoryTrait};
use crate::settings::{ExecutionMode, ValuationSettings};

#[async_trait]
pub trait BatchOrchestratorTrait: Send + Sync {
    /// Values every property in `properties`, in order.
    ///
    /// Fails with `EmptySelection` for an empty slice and with
    /// `MissingParameter` before any property is touched when a required
    /// parameter is absent. A cache hit returns the stored results without
    /// progress notifications. On a miss, any per-property failure or an
    /// observed cancellation aborts the batch; nothing is cached or persisted.
    /// A history failure is returned in `BatchOutcome::persistence_error`
    /// alongside the computed results.
    ///
    /// The computation is CPU-bound. On a multi-threaded tokio runtime it runs
    /// under `block_in_place`; otherwise it runs inline on the calling task.
    /// Callers that need full control can use `evaluate_batch` directly.
    async fn run(
        &self,
        properties: &[PropertyRecord],
        params: &NewAppraisalParameters,
        progress: &dyn ProgressSink,
        cancellation: &CancellationFlag,
    ) -> Result<BatchOutcome>;

    /// Resolves `property_ids` through the property source, then runs as `run`.
    async fn run_selection(
        &self,
        property_ids: &[String],
        params: &NewAppraisalParameters,
        progress: &dyn ProgressSink,
        cancellation: &CancellationFlag,
    ) -> Result<BatchOutcome>;

    /// Drops every cached batch.
    fn invalidate_cache(&self);
}

pub struct BatchOrchestrator {
    calculator: ValuationCalculator,
    execution_mode: ExecutionMode,
    cache: Arc<dyn ResultCacheTrait>,
    history_repository: Arc<dyn ValuationHistoryRepositoryTrait>,
    property_repository: Arc<dyn PropertyRepositoryTrait>,
}

impl BatchOrchestrator {
    pub fn new(
        calculator: ValuationCalculator,
        execution_mode: ExecutionMode,
        cache: Arc<dyn ResultCacheTrait>,
        history_repository: Arc<dyn ValuationHistoryRepositoryTrait>,
        property_repository: Arc<dyn PropertyRepositoryTrait>,
    ) -> Self {
        Self {
            calculator,
            execution_mode,
            cache,
            history_repository,
            property_repository,
        }
    }

    pub fn from_settings(
        settings: &ValuationSettings,
        cache: Arc<dyn ResultCacheTrait>,
        history_repository: Arc<dyn ValuationHistoryRepositoryTrait>,
        property_repository: Arc<dyn PropertyRepositoryTrait>,
    ) -> Self {
        Self::new(
            ValuationCalculator::from_settings(settings),
            settings.execution_mode,
            cache,
            history_repository,
            property_repository,
        )
    }

    /// Evaluates `properties` in order without the cache or history.
    ///
    /// Synchronous, so async callers can move it onto a blocking thread.
    pub fn evaluate_batch(
        &self,
        properties: &[PropertyRecord],
        params: &AppraisalParameters,
        progress: &dyn ProgressSink,
        cancellation: &CancellationFlag,
    ) -> Result<Vec<ValuationResult>> {
        self.compute(Uuid::new_v4(), properties, params, progress, cancellation)
    }

    /// Runs `compute` without stalling other tasks on a multi-threaded runtime.
    fn compute_off_executor(
        &self,
        batch_id: Uuid,
        properties: &[PropertyRecord],
        params: &AppraisalParameters,
        progress: &dyn ProgressSink,
        cancellation: &CancellationFlag,
    ) -> Result<Vec<ValuationResult>> {
        let multi_thread = Handle::try_current()
            .map(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread)
            .unwrap_or(false);
        if multi_thread {
            tokio::task::block_in_place(|| {
                self.compute(batch_id, properties, params, progress, cancellation)
            })
        } else {
            self.compute(batch_id, properties, params, progress, cancellation)
        }
    }

    fn compute(
        &self,
        batch_id: Uuid,
        properties: &[PropertyRecord],
        params: &AppraisalParameters,
        progress: &dyn ProgressSink,
        cancellation: &CancellationFlag,
    ) -> Result<Vec<ValuationResult>> {
        let outcome = match self.execution_mode {
            ExecutionMode::Sequential => {
                self.compute_sequential(properties, params, progress, cancellation)
            }
            ExecutionMode::Parallel => {
                self.compute_parallel(properties, params, progress, cancellation)
            }
        };

        if let Err(e) = &outcome {
            match e {
                Error::Cancelled { completed, total } => warn!(
                    "Valuation batch {} cancelled after {} of {} properties; discarding partial results",
                    batch_id, completed, total
                ),
                other => error!("Valuation batch {} failed: {}", batch_id, other),
            }
        }
        outcome
    }

    fn compute_sequential(
        &self,
        properties: &[PropertyRecord],
        params: &AppraisalParameters,
        progress: &dyn ProgressSink,
        cancellation: &CancellationFlag,
    ) -> Result<Vec<ValuationResult>> {
        let total = properties.len();
        let mut results = Vec::with_capacity(total);

        for (index, property) in properties.iter().enumerate() {
            if cancellation.is_cancelled() {
                return Err(Error::Cancelled {
                    completed: index,
                    total,
                });
            }
            let result = self
                .calculator
                .evaluate(property, params)
                .map_err(|e| e.for_property(&property.id))?;
            results.push(result);
            progress.report(index + 1, total);
        }

        Ok(results)
    }

    fn compute_parallel(
        &self,
        properties: &[PropertyRecord],
        params: &AppraisalParameters,
        progress: &dyn ProgressSink,
        cancellation: &CancellationFlag,
    ) -> Result<Vec<ValuationResult>> {
        let total = properties.len();
        // Held while reporting so notifications stay in counter order
        let completed = Mutex::new(0usize);

        properties
            .par_iter()
            .map(|property| {
                if cancellation.is_cancelled() {
                    let done = *completed.lock().unwrap_or_else(PoisonError::into_inner);
                    return Err(Error::Cancelled {
                        completed: done,
                        total,
                    });
                }
                let result = self
                    .calculator
                    .evaluate(property, params)
                    .map_err(|e| e.for_property(&property.id))?;

                let mut done = completed.lock().unwrap_or_else(PoisonError::into_inner);
                *done += 1;
                progress.report(*done, total);
                Ok(result)
            })
            .collect()
    }

    async fn persist(
        &self,
        batch_id: Uuid,
        label: String,
        params: &AppraisalParameters,
        results: &[ValuationResult],
        totals: &BatchTotals,
    ) -> Result<ValuationHistory> {
        let entry = NewValuationHistory {
            batch_id,
            label,
            parameters: params.clone(),
            results: results.to_vec(),
            total_count: totals.total_count,
            total_appraised_value: totals.total_appraised_value,
            created_at: Utc::now(),
        };

        self.history_repository
            .save_history(entry)
            .await
            .map_err(|e| match e {
                Error::Persistence(_) => e,
                other => Error::Persistence(other.to_string()),
            })
    }
}

/// Caller-supplied label, or one derived from the reference date and size.
fn history_label(
    raw: &NewAppraisalParameters,
    params: &AppraisalParameters,
    count: usize,
) -> String {
    raw.label
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let date = params
                .reference_date
                .unwrap_or_else(|| Utc::now().date_naive());
            format!("RVR {} ({} properties)", date.format("%Y-%m-%d"), count)
        })
}

#[async_trait]
impl BatchOrchestratorTrait for BatchOrchestrator {
    async fn run(
        &self,
        properties: &[PropertyRecord],
        params: &NewAppraisalParameters,
        progress: &dyn ProgressSink,
        cancellation: &CancellationFlag,
    ) -> Result<BatchOutcome> {
        if properties.is_empty() {
            return Err(Error::EmptySelection);
        }
        let parameters = params.validate()?;

        let started = Instant::now();
        let batch_id = Uuid::new_v4();
        let key = CacheKey::for_calculator(
            &self.calculator,
            parameters.clone(),
            fingerprint(properties),
        );

        if let Some(results) = self.cache.lookup(&key) {
            debug!(
                "Valuation batch {}: cache hit for {} properties (fingerprint {})",
                batch_id,
                results.len(),
                key.fingerprint
            );
            let totals = BatchTotals::from_results(&results)?;
            return Ok(BatchOutcome {
                batch_id,
                results,
                totals,
                cache_hit: true,
                history: None,
                persistence_error: None,
            });
        }

        debug!(
            "Valuation batch {}: cache miss, evaluating {} properties ({:?})",
            batch_id,
            properties.len(),
            self.execution_mode
        );
        let results =
            self.compute_off_executor(batch_id, properties, &parameters, progress, cancellation)?;
        let totals = BatchTotals::from_results(&results)?;

        self.cache.store(key, results.clone());

        let label = history_label(params, &parameters, totals.total_count);
        let (history, persistence_error) = match self
            .persist(batch_id, label, &parameters, &results, &totals)
            .await
        {
            Ok(history) => (Some(history), None),
            Err(e) => {
                warn!(
                    "Valuation batch {} computed but history was not saved: {}",
                    batch_id, e
                );
                (None, Some(e))
            }
        };

        info!(
            "Valuation batch {} completed: {} properties, total appraised value {} in {:?}",
            batch_id,
            totals.total_count,
            totals.total_appraised_value,
            started.elapsed()
        );

        Ok(BatchOutcome {
            batch_id,
            results,
            totals,
            cache_hit: false,
            history,
            persistence_error,
        })
    }

    async fn run_selection(
        &self,
        property_ids: &[String],
        params: &NewAppraisalParameters,
        progress: &dyn ProgressSink,
        cancellation: &CancellationFlag,
    ) -> Result<BatchOutcome> {
        if property_ids.is_empty() {
            return Err(Error::EmptySelection);
        }
        let properties = self.property_repository.get_by_ids(property_ids)?;
        self.run(&properties, params, progress, cancellation).await
    }

    fn invalidate_cache(&self) {
        self.cache.clear();
    }
}
