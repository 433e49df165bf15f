//! Ross-Heidecke depreciation.
//!
//! The Ross coefficient weights the mean of linear and quadratic aging:
//! with `i` the age ratio in percent, `Kage = (i² + i) / 200` percent. The
//! Heidecke coefficient `Kcons` comes from the conservation table. Both are
//! combined as `K = Kage + Kcons - Kage * Kcons`, which stays in [0, 1] and
//! does not depend on the order of its operands.

use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::conservation::{ConservationGrade, ConservationTable};
use crate::errors::{Result, ValidationError};

/// Breakdown of one depreciation computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepreciationResult {
    /// Apparent age over useful life, capped at 1.
    pub age_ratio: Decimal,
    /// Ross age coefficient as a fraction.
    pub age_coefficient: Decimal,
    /// Heidecke coefficient for the conservation grade.
    pub conservation_coefficient: Decimal,
    pub combined_coefficient: Decimal,
    /// Share of the reconstruction cost lost to depreciation, in [0, 1].
    pub depreciated_fraction: Decimal,
    pub conservation_grade: ConservationGrade,
    pub depreciated_value: Decimal,
    pub depreciation_amount: Decimal,
}

/// Pure Ross-Heidecke calculator bound to a conservation table.
#[derive(Debug, Clone, Default)]
pub struct DepreciationEngine {
    table: ConservationTable,
}

impl DepreciationEngine {
    pub fn new(table: ConservationTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ConservationTable {
        &self.table
    }

    /// Depreciates `reconstruction_cost` for a building of the given age and state.
    ///
    /// Fails on a non-positive useful life or negative cost/age. An apparent
    /// age beyond the useful life is capped, not rejected.
    pub fn depreciate(
        &self,
        reconstruction_cost: Decimal,
        apparent_age: Decimal,
        useful_life: Decimal,
        conservation_grade: ConservationGrade,
    ) -> Result<DepreciationResult> {
        if useful_life.is_zero() {
            return Err(ValidationError::ZeroUsefulLife.into());
        }
        ensure_non_negative("usefulLife", useful_life)?;
        ensure_non_negative("reconstructionCost", reconstruction_cost)?;
        ensure_non_negative("apparentAge", apparent_age)?;

        let raw_ratio = checked(apparent_age.checked_div(useful_life), "age ratio")?;
        if raw_ratio > Decimal::ONE {
            debug!(
                "Apparent age {} exceeds useful life {}; capping age ratio at 1",
                apparent_age, useful_life
            );
        }
        let age_ratio = raw_ratio.min(Decimal::ONE);

        let age_coefficient = ross_coefficient(age_ratio);
        let conservation_coefficient = self.table.coefficient(conservation_grade);
        let combined_coefficient = combine(age_coefficient, conservation_coefficient);
        let depreciated_fraction = combined_coefficient.clamp(Decimal::ZERO, Decimal::ONE);

        let depreciated_value = checked(
            reconstruction_cost.checked_mul(Decimal::ONE - depreciated_fraction),
            "depreciated value",
        )?;
        let depreciation_amount = reconstruction_cost - depreciated_value;

        Ok(DepreciationResult {
            age_ratio,
            age_coefficient,
            conservation_coefficient,
            combined_coefficient,
            depreciated_fraction,
            conservation_grade,
            depreciated_value,
            depreciation_amount,
        })
    }
}

/// Ross coefficient for an age ratio in [0, 1], returned as a fraction.
pub fn ross_coefficient(age_ratio: Decimal) -> Decimal {
    let percent = age_ratio * dec!(100);
    (percent * percent + percent) / dec!(200) / dec!(100)
}

/// Heidecke combination of two deterioration coefficients.
pub fn combine(first: Decimal, second: Decimal) -> Decimal {
    first + second - first * second
}

/// Turns an overflowed checked operation into an input error naming `quantity`.
pub(crate) fn checked(value: Option<Decimal>, quantity: &str) -> Result<Decimal> {
    value.ok_or_else(|| ValidationError::InvalidInput(format!("{quantity} overflows")).into())
}

pub(crate) fn ensure_non_negative(field: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::NegativeValue {
            field: field.to_string(),
            value,
        }
        .into());
    }
    Ok(())
}
