//! Settings module - explicit configuration for the valuation pipeline.

mod settings_model;

pub use settings_model::{ExecutionMode, ValuationSettings};
