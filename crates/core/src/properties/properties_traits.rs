use crate::errors::Result;
use crate::properties::properties_model::PropertyRecord;

/// Source of property records for a user selection.
pub trait PropertyRepositoryTrait: Send + Sync {
    /// Returns the records for `ids`, in the order the ids were given.
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<PropertyRecord>>;
}
