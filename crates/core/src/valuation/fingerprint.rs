//! Content fingerprint of a property selection.
//!
//! Only the fields that feed the valuation cache key are hashed (id, built
//! area, land area, apparent age, recorded value), so edits to unrelated
//! fields such as the address keep the fingerprint stable. The fingerprint is
//! order-sensitive: the same set of properties in a different order hashes
//! differently.

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::properties::PropertyRecord;

/// Computes the SHA-256 fingerprint of `properties`, hex encoded.
///
/// Every field is length-prefixed, so no id can mimic a record boundary.
pub fn fingerprint(properties: &[PropertyRecord]) -> String {
    let mut hasher = Sha256::new();

    for property in properties {
        update_field(&mut hasher, property.id.as_bytes());
        update_field(&mut hasher, normalize_decimal(property.built_area).as_bytes());
        update_field(&mut hasher, normalize_decimal(property.land_area).as_bytes());
        // Absent age hashes differently from any explicit age
        match property.apparent_age {
            Some(age) => update_field(&mut hasher, normalize_decimal(age).as_bytes()),
            None => update_field(&mut hasher, b"-"),
        }
        update_field(&mut hasher, normalize_decimal(property.recorded_value).as_bytes());
    }

    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Remove trailing zeros so 100 and 100.00 hash alike
fn normalize_decimal(d: Decimal) -> String {
    d.normalize().to_string()
}
