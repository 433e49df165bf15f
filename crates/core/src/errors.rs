//! Core error types for the valuation pipeline.
//!
//! Every failure surfaced to the caller carries enough context (property
//! identifier, parameter name) to render a user-facing message.

use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the valuation pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("Required appraisal parameter '{0}' is missing or not numeric")]
    MissingParameter(String),

    #[error("No properties selected for valuation")]
    EmptySelection,

    #[error("Failed to save valuation history: {0}")]
    Persistence(String),

    #[error("Valuation batch cancelled after {completed} of {total} properties")]
    Cancelled { completed: usize, total: usize },

    #[error("Valuation failed for property {property_id}: {source}")]
    Property {
        property_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl Error {
    /// Attaches the identifier of the property being evaluated.
    ///
    /// Errors already scoped to a property are returned unchanged.
    pub fn for_property(self, property_id: &str) -> Self {
        match self {
            Error::Property { .. } => self,
            other => Error::Property {
                property_id: property_id.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, skipping property scoping.
    pub fn root(&self) -> &Error {
        match self {
            Error::Property { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if the error is an `InvalidInput` at any scoping level.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.root(), Error::InvalidInput(_))
    }
}

/// Validation errors for property data and appraisal inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Unknown conservation grade '{0}'")]
    UnknownConservationGrade(String),

    #[error("Useful life must be greater than zero")]
    ZeroUsefulLife,

    #[error("Field '{field}' must not be negative (got {value})")]
    NegativeValue { field: String, value: Decimal },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_for_property_wraps_once() {
        let err = Error::InvalidInput(ValidationError::ZeroUsefulLife)
            .for_property("P-1")
            .for_property("P-2");

        match &err {
            Error::Property { property_id, .. } => assert_eq!(property_id, "P-1"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_invalid_input());
        assert_eq!(
            err.to_string(),
            "Valuation failed for property P-1: Invalid input: Useful life must be greater than zero"
        );
    }

    #[test]
    fn test_negative_value_message_names_field() {
        let err = Error::from(ValidationError::NegativeValue {
            field: "builtArea".to_string(),
            value: dec!(-10),
        });
        assert_eq!(
            err.to_string(),
            "Invalid input: Field 'builtArea' must not be negative (got -10)"
        );
    }

    #[test]
    fn test_missing_parameter_message() {
        let err = Error::MissingParameter("markupPercent".to_string());
        assert!(err.to_string().contains("markupPercent"));
        assert!(!err.is_invalid_input());
    }
}
