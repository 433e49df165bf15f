//! Valuation settings.
//!
//! Defaults, the conservation table and cache bounds are passed explicitly to
//! the engine, calculator, cache and orchestrator; there is no global state.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_APPARENT_AGE_YEARS, DEFAULT_USEFUL_LIFE_YEARS, RESULT_CACHE_CAPACITY,
    RESULT_CACHE_TTL_MINUTES,
};
use crate::errors::{Error, Result};
use crate::valuation::{ConservationGrade, ConservationTable};

/// How the orchestrator walks the selected properties on a cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One property after another, in selection order
    #[default]
    Sequential,
    /// Properties are evaluated on the rayon pool; result order is preserved
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValuationSettings {
    pub default_apparent_age: Decimal,
    pub default_useful_life: Decimal,
    pub default_conservation_grade: ConservationGrade,
    pub location_factor: Decimal,
    pub conservation_table: ConservationTable,
    pub cache_ttl_minutes: i64,
    pub cache_capacity: usize,
    pub execution_mode: ExecutionMode,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            default_apparent_age: Decimal::from(DEFAULT_APPARENT_AGE_YEARS),
            default_useful_life: Decimal::from(DEFAULT_USEFUL_LIFE_YEARS),
            default_conservation_grade: ConservationGrade::default(),
            location_factor: Decimal::ONE,
            conservation_table: ConservationTable::heidecke(),
            cache_ttl_minutes: RESULT_CACHE_TTL_MINUTES,
            cache_capacity: RESULT_CACHE_CAPACITY,
            execution_mode: ExecutionMode::default(),
        }
    }
}

impl ValuationSettings {
    /// Parses settings from JSON; omitted keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: ValuationSettings =
            serde_json::from_str(json).map_err(|e| Error::ConfigParse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_apparent_age < Decimal::ZERO {
            return Err(Error::InvalidConfigValue(format!(
                "defaultApparentAge must not be negative, got {}",
                self.default_apparent_age
            )));
        }
        if self.default_useful_life <= Decimal::ZERO {
            return Err(Error::InvalidConfigValue(format!(
                "defaultUsefulLife must be greater than zero, got {}",
                self.default_useful_life
            )));
        }
        if self.location_factor <= Decimal::ZERO {
            return Err(Error::InvalidConfigValue(format!(
                "locationFactor must be greater than zero, got {}",
                self.location_factor
            )));
        }
        if self.cache_ttl_minutes <= 0 {
            return Err(Error::InvalidConfigValue(format!(
                "cacheTtlMinutes must be greater than zero, got {}",
                self.cache_ttl_minutes
            )));
        }
        if self.cache_capacity == 0 {
            return Err(Error::InvalidConfigValue(
                "cacheCapacity must be greater than zero".to_string(),
            ));
        }
        self.conservation_table.validate()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::minutes(self.cache_ttl_minutes)
    }
}
