//! Property inventory domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A property as imported from the inventory, read-only to the valuation core.
///
/// Age, useful life and conservation state are often missing from user
/// uploads; the calculator substitutes configured defaults for them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: String,
    pub registration_number: Option<String>,
    pub address: Option<String>,
    /// Built area in m²
    pub built_area: Decimal,
    /// Land area in m²
    pub land_area: Decimal,
    /// Apparent age in years
    pub apparent_age: Option<Decimal>,
    /// Estimated useful life in years
    pub useful_life: Option<Decimal>,
    /// Conservation grade as entered, letter A..H or its description
    pub conservation_state: Option<String>,
    /// Reference value previously recorded for the property
    pub recorded_value: Decimal,
}

impl PropertyRecord {
    /// Label for messages: registration number when known, otherwise the id.
    pub fn display_label(&self) -> &str {
        self.registration_number
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.id)
    }
}
