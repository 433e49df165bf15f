//! Valuation module - Ross-Heidecke depreciation, per-property valuation,
//! result caching and batch orchestration.

pub mod batch_orchestrator;
pub mod conservation;
pub mod depreciation;
pub mod fingerprint;
pub mod progress;
pub mod result_cache;
pub mod valuation_calculator;
pub mod valuation_model;
pub mod valuation_traits;

#[cfg(test)]
mod valuation_calculator_tests;

pub use batch_orchestrator::{BatchOrchestrator, BatchOrchestratorTrait};
pub use conservation::{ConservationGrade, ConservationTable};
pub use depreciation::{DepreciationEngine, DepreciationResult};
pub use fingerprint::fingerprint;
pub use progress::*;
pub use result_cache::{CacheEntry, CacheKey, InMemoryResultCache, ResultCacheTrait};
pub use valuation_calculator::{CalculatorDefaults, ValuationCalculator};
pub use valuation_model::*;
pub use valuation_traits::ValuationHistoryRepositoryTrait;
