//! Repository traits for valuation history.

use async_trait::async_trait;

use super::valuation_model::{NewValuationHistory, ValuationHistory};
use crate::errors::Result;

/// Durable record of completed valuation batches.
///
/// Failures here are reported to the caller as warnings; they never revoke
/// results that were already computed.
#[async_trait]
pub trait ValuationHistoryRepositoryTrait: Send + Sync {
    /// Records one batch: label, parameters, results and totals.
    async fn save_history(&self, entry: NewValuationHistory) -> Result<ValuationHistory>;
}
