use log::debug;
use rust_decimal::Decimal;

use super::conservation::ConservationGrade;
use super::depreciation::{checked, ensure_non_negative, DepreciationEngine};
use super::valuation_model::{percent_of, AppraisalParameters, DefaultedField, ValuationResult};
use crate::errors::Result;
use crate::properties::PropertyRecord;
use crate::settings::ValuationSettings;

/// Fallbacks used when a property record lacks age, life or grade.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CalculatorDefaults {
    pub apparent_age: Decimal,
    pub useful_life: Decimal,
    pub conservation_grade: ConservationGrade,
    /// Multiplier on land plus improvement value; 1 means no adjustment
    pub location_factor: Decimal,
}

impl From<&ValuationSettings> for CalculatorDefaults {
    fn from(settings: &ValuationSettings) -> Self {
        Self {
            apparent_age: settings.default_apparent_age,
            useful_life: settings.default_useful_life,
            conservation_grade: settings.default_conservation_grade,
            location_factor: settings.location_factor,
        }
    }
}

impl Default for CalculatorDefaults {
    fn default() -> Self {
        Self::from(&ValuationSettings::default())
    }
}

/// Computes the reference value of a single property.
#[derive(Debug, Clone, Default)]
pub struct ValuationCalculator {
    engine: DepreciationEngine,
    defaults: CalculatorDefaults,
}

impl ValuationCalculator {
    pub fn new(engine: DepreciationEngine, defaults: CalculatorDefaults) -> Self {
        Self { engine, defaults }
    }

    pub fn from_settings(settings: &ValuationSettings) -> Self {
        Self::new(
            DepreciationEngine::new(settings.conservation_table.clone()),
            CalculatorDefaults::from(settings),
        )
    }

    pub fn engine(&self) -> &DepreciationEngine {
        &self.engine
    }

    pub fn defaults(&self) -> &CalculatorDefaults {
        &self.defaults
    }

    /// Values `property` under `params`.
    ///
    /// reconstruction cost = built area × unit cost × (1 + markup / 100),
    /// land value = land area × land unit price, and the appraised value is
    /// land value plus depreciated improvement value, scaled by the location
    /// factor.
    pub fn evaluate(
        &self,
        property: &PropertyRecord,
        params: &AppraisalParameters,
    ) -> Result<ValuationResult> {
        ensure_non_negative("builtArea", property.built_area)?;
        ensure_non_negative("landArea", property.land_area)?;

        let mut defaults_applied = Vec::new();

        let apparent_age = property.apparent_age.unwrap_or_else(|| {
            defaults_applied.push(DefaultedField::ApparentAge);
            self.defaults.apparent_age
        });
        let useful_life = property.useful_life.unwrap_or_else(|| {
            defaults_applied.push(DefaultedField::UsefulLife);
            self.defaults.useful_life
        });
        let conservation_grade = match property
            .conservation_state
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            Some(raw) => raw.parse::<ConservationGrade>()?,
            None => {
                defaults_applied.push(DefaultedField::ConservationGrade);
                self.defaults.conservation_grade
            }
        };

        if !defaults_applied.is_empty() {
            debug!(
                "Property {} is missing {:?}; using configured defaults",
                property.id, defaults_applied
            );
        }

        let markup_multiplier = Decimal::ONE + params.markup_percent / Decimal::ONE_HUNDRED;
        let reconstruction_cost = checked(
            property
                .built_area
                .checked_mul(params.reconstruction_unit_cost)
                .and_then(|cost| cost.checked_mul(markup_multiplier)),
            "reconstruction cost",
        )?;
        let land_value = checked(
            property.land_area.checked_mul(params.land_unit_price),
            "land value",
        )?;

        let depreciation =
            self.engine
                .depreciate(reconstruction_cost, apparent_age, useful_life, conservation_grade)?;

        let location_factor = self.defaults.location_factor;
        let appraised_value = checked(
            land_value
                .checked_add(depreciation.depreciated_value)
                .and_then(|value| value.checked_mul(location_factor)),
            "appraised value",
        )?;
        let delta = checked(
            appraised_value.checked_sub(property.recorded_value),
            "delta",
        )?;
        let delta_percent = percent_of(delta, property.recorded_value)?;

        Ok(ValuationResult {
            property_id: property.id.clone(),
            built_area: property.built_area,
            land_area: property.land_area,
            apparent_age,
            useful_life,
            reconstruction_cost,
            land_value,
            depreciated_improvement_value: depreciation.depreciated_value,
            location_factor,
            appraised_value,
            recorded_value: property.recorded_value,
            delta,
            delta_percent,
            defaults_applied,
            depreciation,
            parameters: params.clone(),
        })
    }
}
