//! RVR Core - Reference Value Report valuation pipeline.
//!
//! Given a selection of property records and a set of appraisal parameters,
//! this crate computes a depreciated replacement value per property using the
//! Ross-Heidecke method, aggregates the batch, memoizes it against a content
//! fingerprint and reports progress. Persistence and property loading are
//! reached only through the traits defined here.

pub mod constants;
pub mod errors;
pub mod properties;
pub mod settings;
pub mod valuation;

pub use properties::*;
pub use valuation::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
