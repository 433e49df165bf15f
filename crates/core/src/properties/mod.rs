//! Properties module - inventory records consumed by the valuation pipeline.

mod properties_model;
mod properties_traits;

pub use properties_model::PropertyRecord;
pub use properties_traits::PropertyRepositoryTrait;
