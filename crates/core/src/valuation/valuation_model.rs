//! Valuation domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::depreciation::{checked, DepreciationResult};
use crate::errors::{Error, Result, ValidationError};

pub const PARAM_LAND_UNIT_PRICE: &str = "landUnitPrice";
pub const PARAM_RECONSTRUCTION_UNIT_COST: &str = "reconstructionUnitCost";
pub const PARAM_MARKUP_PERCENT: &str = "markupPercent";

/// Appraisal parameters as entered in the wizard.
///
/// Numeric fields arrive as free text and are validated by
/// [`NewAppraisalParameters::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppraisalParameters {
    pub land_unit_price: Option<String>,
    pub reconstruction_unit_cost: Option<String>,
    /// Contractor markup (BDI) in percent
    pub markup_percent: Option<String>,
    pub reference_date: Option<NaiveDate>,
    pub land_value_source: Option<String>,
    pub technical_reviewer: Option<String>,
    /// Label for the history record; a default is derived when absent
    pub label: Option<String>,
}

impl NewAppraisalParameters {
    /// Builds an input from already-numeric values.
    pub fn from_values(
        land_unit_price: Decimal,
        reconstruction_unit_cost: Decimal,
        markup_percent: Decimal,
    ) -> Self {
        Self {
            land_unit_price: Some(land_unit_price.to_string()),
            reconstruction_unit_cost: Some(reconstruction_unit_cost.to_string()),
            markup_percent: Some(markup_percent.to_string()),
            ..Default::default()
        }
    }

    /// Parses the required numeric parameters.
    ///
    /// Absent, blank or non-numeric values fail with `MissingParameter`;
    /// negative values fail with `InvalidInput`.
    pub fn validate(&self) -> Result<AppraisalParameters> {
        Ok(AppraisalParameters {
            land_unit_price: parse_parameter(PARAM_LAND_UNIT_PRICE, &self.land_unit_price)?,
            reconstruction_unit_cost: parse_parameter(
                PARAM_RECONSTRUCTION_UNIT_COST,
                &self.reconstruction_unit_cost,
            )?,
            markup_percent: parse_parameter(PARAM_MARKUP_PERCENT, &self.markup_percent)?,
            reference_date: self.reference_date,
            land_value_source: non_blank(&self.land_value_source),
            technical_reviewer: non_blank(&self.technical_reviewer),
        })
    }
}

fn parse_parameter(name: &str, raw: &Option<String>) -> Result<Decimal> {
    let text = raw
        .as_deref()
        .map(|s| s.trim().trim_end_matches('%').trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::MissingParameter(name.to_string()))?;

    let value = Decimal::from_str(&normalize_decimal_separators(text))
        .map_err(|_| Error::MissingParameter(name.to_string()))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::NegativeValue {
            field: name.to_string(),
            value,
        }
        .into());
    }
    Ok(value)
}

/// Accepts both "1,234.50" and "1.234,50": whichever separator comes last is
/// the decimal point, the other one groups thousands.
fn normalize_decimal_separators(text: &str) -> String {
    match (text.rfind('.'), text.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => text.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => text.replace(',', ""),
        (None, Some(_)) => text.replace(',', "."),
        _ => text.to_string(),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validated appraisal parameters, immutable for the duration of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AppraisalParameters {
    /// Currency per m² of land
    pub land_unit_price: Decimal,
    /// Currency per m² of built area
    pub reconstruction_unit_cost: Decimal,
    pub markup_percent: Decimal,
    pub reference_date: Option<NaiveDate>,
    pub land_value_source: Option<String>,
    pub technical_reviewer: Option<String>,
}

/// Property fields that fell back to configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefaultedField {
    ApparentAge,
    UsefulLife,
    ConservationGrade,
}

/// Reference value computed for one property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResult {
    pub property_id: String,
    pub built_area: Decimal,
    pub land_area: Decimal,
    pub apparent_age: Decimal,
    pub useful_life: Decimal,
    pub reconstruction_cost: Decimal,
    pub land_value: Decimal,
    pub depreciated_improvement_value: Decimal,
    pub location_factor: Decimal,
    pub appraised_value: Decimal,
    pub recorded_value: Decimal,
    pub delta: Decimal,
    /// Delta over the recorded value in percent, 0 when nothing was recorded
    pub delta_percent: Decimal,
    pub defaults_applied: Vec<DefaultedField>,
    pub depreciation: DepreciationResult,
    pub parameters: AppraisalParameters,
}

/// Aggregates over one batch of results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchTotals {
    pub total_count: usize,
    pub total_appraised_value: Decimal,
    pub total_recorded_value: Decimal,
    pub total_delta: Decimal,
    pub total_delta_percent: Decimal,
}

impl BatchTotals {
    /// Fails only when a sum or the percentage overflows.
    pub fn from_results(results: &[ValuationResult]) -> Result<Self> {
        let mut total_appraised_value = Decimal::ZERO;
        let mut total_recorded_value = Decimal::ZERO;
        for result in results {
            total_appraised_value = checked(
                total_appraised_value.checked_add(result.appraised_value),
                "total appraised value",
            )?;
            total_recorded_value = checked(
                total_recorded_value.checked_add(result.recorded_value),
                "total recorded value",
            )?;
        }
        let total_delta = checked(
            total_appraised_value.checked_sub(total_recorded_value),
            "total delta",
        )?;
        Ok(Self {
            total_count: results.len(),
            total_appraised_value,
            total_recorded_value,
            total_delta,
            total_delta_percent: percent_of(total_delta, total_recorded_value)?,
        })
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub(crate) fn percent_of(part: Decimal, whole: Decimal) -> Result<Decimal> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let ratio = checked(part.checked_div(whole), "delta percent")?;
    checked(ratio.checked_mul(Decimal::ONE_HUNDRED), "delta percent")
}

/// Batch handed to the history collaborator after a successful computation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewValuationHistory {
    pub batch_id: Uuid,
    pub label: String,
    pub parameters: AppraisalParameters,
    pub results: Vec<ValuationResult>,
    pub total_count: usize,
    pub total_appraised_value: Decimal,
    pub created_at: DateTime<Utc>,
}

/// History record as stored by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationHistory {
    pub id: String,
    pub batch_id: Uuid,
    pub label: String,
    pub total_count: usize,
    pub total_appraised_value: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Outcome of one batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    pub batch_id: Uuid,
    pub results: Vec<ValuationResult>,
    pub totals: BatchTotals,
    /// True when the results were served from the result cache
    pub cache_hit: bool,
    /// Stored history record, when persistence ran and succeeded
    pub history: Option<ValuationHistory>,
    /// Persistence failure; the results above remain valid
    pub persistence_error: Option<Error>,
}

impl BatchOutcome {
    pub fn has_warnings(&self) -> bool {
        self.persistence_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(land: Option<&str>, cost: Option<&str>, markup: Option<&str>) -> NewAppraisalParameters {
        NewAppraisalParameters {
            land_unit_price: land.map(str::to_string),
            reconstruction_unit_cost: cost.map(str::to_string),
            markup_percent: markup.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_parses_numbers() {
        let params = input(Some("150"), Some(" 2100.00 "), Some("25%"))
            .validate()
            .unwrap();
        assert_eq!(params.land_unit_price, dec!(150));
        assert_eq!(params.reconstruction_unit_cost, dec!(2100));
        assert_eq!(params.markup_percent, dec!(25));
    }

    #[test]
    fn test_validate_accepts_decimal_comma() {
        let params = input(Some("1.234,50"), Some("2100,75"), Some("1,234.5"))
            .validate()
            .unwrap();
        assert_eq!(params.land_unit_price, dec!(1234.50));
        assert_eq!(params.reconstruction_unit_cost, dec!(2100.75));
        assert_eq!(params.markup_percent, dec!(1234.5));
    }

    #[test]
    fn test_validate_missing_markup() {
        let err = input(Some("150"), Some("2100"), None).validate().unwrap_err();
        match err {
            Error::MissingParameter(name) => assert_eq!(name, PARAM_MARKUP_PERCENT),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_blank_and_non_numeric_are_missing() {
        let err = input(Some("  "), Some("2100"), Some("25")).validate().unwrap_err();
        assert!(matches!(err, Error::MissingParameter(ref n) if n == PARAM_LAND_UNIT_PRICE));

        let err = input(Some("150"), Some("abc"), Some("25")).validate().unwrap_err();
        assert!(matches!(err, Error::MissingParameter(ref n) if n == PARAM_RECONSTRUCTION_UNIT_COST));
    }

    #[test]
    fn test_validate_negative_is_invalid_input() {
        let err = input(Some("-5"), Some("2100"), Some("25")).validate().unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_validate_trims_optional_text() {
        let mut raw = NewAppraisalParameters::from_values(dec!(1), dec!(2), dec!(3));
        raw.land_value_source = Some("  ".to_string());
        raw.technical_reviewer = Some(" Eng. Silva ".to_string());
        let params = raw.validate().unwrap();
        assert_eq!(params.land_value_source, None);
        assert_eq!(params.technical_reviewer.as_deref(), Some("Eng. Silva"));
    }

    #[test]
    fn test_percent_of_zero_whole() {
        assert_eq!(percent_of(dec!(10), Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(percent_of(dec!(10), dec!(40)).unwrap(), dec!(25));
        assert!(percent_of(Decimal::MAX, dec!(0.001)).is_err());
    }

    #[test]
    fn test_totals_from_results_empty() {
        let totals = BatchTotals::from_results(&[]).unwrap();
        assert_eq!(totals, BatchTotals::default());
    }
}
