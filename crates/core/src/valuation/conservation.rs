//! Heidecke conservation grades and their deterioration table.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{HEIDECKE_COEFFICIENTS, HEIDECKE_TABLE_VERSION};
use crate::errors::{Error, Result, ValidationError};

/// Eight-point ordinal scale describing a building's physical state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum ConservationGrade {
    /// New
    A,
    /// Between new and regular
    B,
    /// Regular
    #[default]
    C,
    /// Between regular and needing simple repairs
    D,
    /// Needs simple repairs
    E,
    /// Between simple and important repairs
    F,
    /// Needs important repairs
    G,
    /// Beyond repair
    H,
}

impl ConservationGrade {
    pub const ALL: [ConservationGrade; 8] = [
        ConservationGrade::A,
        ConservationGrade::B,
        ConservationGrade::C,
        ConservationGrade::D,
        ConservationGrade::E,
        ConservationGrade::F,
        ConservationGrade::G,
        ConservationGrade::H,
    ];

    /// Position on the scale, 0 for A through 7 for H.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConservationGrade::A => "A",
            ConservationGrade::B => "B",
            ConservationGrade::C => "C",
            ConservationGrade::D => "D",
            ConservationGrade::E => "E",
            ConservationGrade::F => "F",
            ConservationGrade::G => "G",
            ConservationGrade::H => "H",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConservationGrade::A => "new",
            ConservationGrade::B => "between new and regular",
            ConservationGrade::C => "regular",
            ConservationGrade::D => "between regular and simple repairs",
            ConservationGrade::E => "simple repairs",
            ConservationGrade::F => "between simple and important repairs",
            ConservationGrade::G => "important repairs",
            ConservationGrade::H => "beyond repair",
        }
    }
}

impl fmt::Display for ConservationGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConservationGrade {
    type Err = Error;

    /// Accepts the grade letter (any case) or its descriptive label.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if normalized.len() == 1 {
            if let Some(grade) = ConservationGrade::ALL
                .iter()
                .find(|g| g.as_str().eq_ignore_ascii_case(&normalized))
            {
                return Ok(*grade);
            }
        }
        ConservationGrade::ALL
            .iter()
            .find(|g| g.description() == normalized)
            .copied()
            .ok_or_else(|| ValidationError::UnknownConservationGrade(s.to_string()).into())
    }
}

/// Versioned mapping from each grade to its deterioration fraction in [0, 1].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConservationTable {
    pub version: String,
    /// Fractions indexed by grade, A first.
    pub coefficients: [Decimal; 8],
}

impl ConservationTable {
    /// Builds a table, rejecting values outside [0, 1] or decreasing from A to H.
    pub fn new(version: impl Into<String>, coefficients: [Decimal; 8]) -> Result<Self> {
        let table = Self {
            version: version.into(),
            coefficients,
        };
        table.validate()?;
        Ok(table)
    }

    /// The standard Heidecke table.
    pub fn heidecke() -> Self {
        Self {
            version: HEIDECKE_TABLE_VERSION.to_string(),
            coefficients: HEIDECKE_COEFFICIENTS,
        }
    }

    pub fn coefficient(&self, grade: ConservationGrade) -> Decimal {
        self.coefficients[grade.index()]
    }

    pub fn validate(&self) -> Result<()> {
        for grade in ConservationGrade::ALL {
            let value = self.coefficient(grade);
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(Error::InvalidConfigValue(format!(
                    "conservation coefficient for grade {} must be within [0, 1], got {}",
                    grade, value
                )));
            }
        }
        if let Some(pair) = self.coefficients.windows(2).position(|w| w[0] > w[1]) {
            return Err(Error::InvalidConfigValue(format!(
                "conservation coefficients must not decrease from grade {} to grade {}",
                ConservationGrade::ALL[pair],
                ConservationGrade::ALL[pair + 1]
            )));
        }
        Ok(())
    }
}

impl Default for ConservationTable {
    fn default() -> Self {
        Self::heidecke()
    }
}
