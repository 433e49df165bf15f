//! Tests for the per-property valuation calculator.

use crate::errors::{Error, ValidationError};
use crate::properties::PropertyRecord;
use crate::settings::ValuationSettings;
use crate::valuation::{
    AppraisalParameters, CalculatorDefaults, ConservationGrade, ConservationTable,
    DefaultedField, DepreciationEngine, ValuationCalculator,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn params() -> AppraisalParameters {
    AppraisalParameters {
        land_unit_price: dec!(150),
        reconstruction_unit_cost: dec!(2100),
        markup_percent: dec!(25),
        reference_date: None,
        land_value_source: Some("Planta Genérica de Valores 2024".to_string()),
        technical_reviewer: Some("Eng. Souza".to_string()),
    }
}

fn reference_property() -> PropertyRecord {
    PropertyRecord {
        id: "prop-1".to_string(),
        built_area: dec!(100),
        land_area: dec!(200),
        apparent_age: Some(dec!(40)),
        useful_life: Some(dec!(80)),
        conservation_state: Some("C".to_string()),
        recorded_value: dec!(200000),
        ..Default::default()
    }
}

// ============================================================================
// Reference example
// ============================================================================

#[test]
fn test_evaluate_reference_example() {
    let calculator = ValuationCalculator::default();
    let result = calculator.evaluate(&reference_property(), &params()).unwrap();

    assert_eq!(result.reconstruction_cost, dec!(262500));
    assert_eq!(result.land_value, dec!(30000));
    assert_eq!(result.depreciation.age_ratio, dec!(0.5));
    assert_eq!(result.depreciation.age_coefficient, dec!(0.1275));
    assert_eq!(result.depreciation.conservation_coefficient, dec!(0.0252));
    assert_eq!(result.depreciated_improvement_value, dec!(223259.6625));
    assert_eq!(result.appraised_value, dec!(253259.6625));
    assert_eq!(result.delta, dec!(53259.6625));
    assert_eq!(result.delta_percent, dec!(26.62983125));
    assert!(result.defaults_applied.is_empty());
    assert_eq!(result.parameters, params());
}

#[test]
fn test_appraised_value_is_land_plus_improvement() {
    let calculator = ValuationCalculator::default();
    let result = calculator.evaluate(&reference_property(), &params()).unwrap();
    assert_eq!(
        result.appraised_value,
        result.land_value + result.depreciated_improvement_value
    );
    assert_eq!(result.location_factor, Decimal::ONE);
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_missing_fields_use_defaults() {
    let property = PropertyRecord {
        apparent_age: None,
        useful_life: None,
        conservation_state: None,
        ..reference_property()
    };
    let result = ValuationCalculator::default()
        .evaluate(&property, &params())
        .unwrap();

    assert_eq!(result.apparent_age, dec!(15));
    assert_eq!(result.useful_life, dec!(80));
    assert_eq!(result.depreciation.conservation_grade, ConservationGrade::C);
    assert_eq!(
        result.defaults_applied,
        vec![
            DefaultedField::ApparentAge,
            DefaultedField::UsefulLife,
            DefaultedField::ConservationGrade
        ]
    );
    // 15 / 80 = 0.1875 -> i = 18.75 -> (351.5625 + 18.75) / 200 / 100
    assert_eq!(result.depreciation.age_coefficient, dec!(0.01851562500));
}

#[test]
fn test_blank_conservation_state_uses_default() {
    let property = PropertyRecord {
        conservation_state: Some("   ".to_string()),
        ..reference_property()
    };
    let result = ValuationCalculator::default()
        .evaluate(&property, &params())
        .unwrap();
    assert_eq!(result.defaults_applied, vec![DefaultedField::ConservationGrade]);
}

#[test]
fn test_configured_defaults_are_used() {
    let settings = ValuationSettings {
        default_apparent_age: dec!(10),
        default_useful_life: dec!(50),
        default_conservation_grade: ConservationGrade::E,
        ..Default::default()
    };
    let calculator = ValuationCalculator::from_settings(&settings);
    let property = PropertyRecord {
        apparent_age: None,
        useful_life: None,
        conservation_state: None,
        ..reference_property()
    };
    let result = calculator.evaluate(&property, &params()).unwrap();
    assert_eq!(result.depreciation.age_ratio, dec!(0.2));
    assert_eq!(result.depreciation.conservation_coefficient, dec!(0.1810));
}

// ============================================================================
// Location factor and deltas
// ============================================================================

#[test]
fn test_location_factor_scales_appraised_value() {
    let calculator = ValuationCalculator::new(
        DepreciationEngine::new(ConservationTable::heidecke()),
        CalculatorDefaults {
            location_factor: dec!(1.1),
            ..CalculatorDefaults::default()
        },
    );
    let result = calculator.evaluate(&reference_property(), &params()).unwrap();
    assert_eq!(result.appraised_value, dec!(253259.6625) * dec!(1.1));
}

#[test]
fn test_zero_recorded_value_gives_zero_percent_delta() {
    let property = PropertyRecord {
        recorded_value: Decimal::ZERO,
        ..reference_property()
    };
    let result = ValuationCalculator::default()
        .evaluate(&property, &params())
        .unwrap();
    assert_eq!(result.delta, result.appraised_value);
    assert_eq!(result.delta_percent, Decimal::ZERO);
}

#[test]
fn test_zero_markup_and_zero_areas() {
    let property = PropertyRecord {
        built_area: Decimal::ZERO,
        land_area: Decimal::ZERO,
        ..reference_property()
    };
    let mut p = params();
    p.markup_percent = Decimal::ZERO;
    let result = ValuationCalculator::default().evaluate(&property, &p).unwrap();
    assert_eq!(result.reconstruction_cost, Decimal::ZERO);
    assert_eq!(result.appraised_value, Decimal::ZERO);
}

// ============================================================================
// Invalid input
// ============================================================================

#[test]
fn test_unknown_conservation_grade_is_invalid_input() {
    let property = PropertyRecord {
        conservation_state: Some("Z".to_string()),
        ..reference_property()
    };
    let err = ValuationCalculator::default()
        .evaluate(&property, &params())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidInput(ValidationError::UnknownConservationGrade(ref g)) if g == "Z"
    ));
}

#[test]
fn test_zero_useful_life_is_invalid_input() {
    let property = PropertyRecord {
        useful_life: Some(Decimal::ZERO),
        ..reference_property()
    };
    let err = ValuationCalculator::default()
        .evaluate(&property, &params())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(ValidationError::ZeroUsefulLife)));
}

#[test]
fn test_negative_area_is_invalid_input() {
    let property = PropertyRecord {
        land_area: dec!(-1),
        ..reference_property()
    };
    let err = ValuationCalculator::default()
        .evaluate(&property, &params())
        .unwrap_err();
    assert!(err.to_string().contains("landArea"));
}

// ============================================================================
// Numeric overflow
// ============================================================================

fn overflow_message(property: &PropertyRecord, params: &AppraisalParameters) -> String {
    let calculator = ValuationCalculator::default();
    match calculator.evaluate(property, params).unwrap_err() {
        Error::InvalidInput(ValidationError::InvalidInput(message)) => message,
        other => panic!("unexpected error: {other:?}"),
    }
}

fn quadrillion() -> Decimal {
    Decimal::from(1_000_000_000_000_000u64)
}

#[test]
fn test_reconstruction_cost_overflow_is_invalid_input() {
    let property = PropertyRecord {
        built_area: quadrillion(),
        ..reference_property()
    };
    let mut p = params();
    p.reconstruction_unit_cost = quadrillion();
    assert_eq!(overflow_message(&property, &p), "reconstruction cost overflows");
}

#[test]
fn test_land_value_overflow_is_invalid_input() {
    let property = PropertyRecord {
        land_area: quadrillion(),
        ..reference_property()
    };
    let mut p = params();
    p.land_unit_price = quadrillion();
    assert_eq!(overflow_message(&property, &p), "land value overflows");
}

#[test]
fn test_age_ratio_overflow_is_invalid_input() {
    let property = PropertyRecord {
        apparent_age: Some(Decimal::new(100_000_000_000, 0)),
        useful_life: Some(Decimal::new(1, 22)),
        ..reference_property()
    };
    assert_eq!(overflow_message(&property, &params()), "age ratio overflows");
}

#[test]
fn test_appraised_value_overflow_is_invalid_input() {
    let calculator = ValuationCalculator::new(
        DepreciationEngine::default(),
        CalculatorDefaults {
            location_factor: quadrillion(),
            ..CalculatorDefaults::default()
        },
    );
    let property = PropertyRecord {
        land_area: quadrillion(),
        ..reference_property()
    };
    let err = calculator.evaluate(&property, &params()).unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: appraised value overflows");
}

#[test]
fn test_delta_percent_overflow_is_invalid_input() {
    let calculator = ValuationCalculator::new(
        DepreciationEngine::default(),
        CalculatorDefaults {
            location_factor: Decimal::from(1_000_000_000u64),
            ..CalculatorDefaults::default()
        },
    );
    // Appraised 1.5e26 against a recorded value of one cent
    let property = PropertyRecord {
        built_area: Decimal::ZERO,
        land_area: quadrillion(),
        recorded_value: dec!(0.01),
        ..reference_property()
    };
    let err = calculator.evaluate(&property, &params()).unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: delta percent overflows");
}
