use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Apparent age (years) assumed when a property record has none
pub const DEFAULT_APPARENT_AGE_YEARS: u32 = 15;

/// Useful life (years) assumed when a property record has none
pub const DEFAULT_USEFUL_LIFE_YEARS: u32 = 80;

/// Cached batch results expire after this many minutes
pub const RESULT_CACHE_TTL_MINUTES: i64 = 30;

/// Maximum number of batches kept in the result cache
pub const RESULT_CACHE_CAPACITY: usize = 10;

/// Version of the built-in Heidecke conservation table
pub const HEIDECKE_TABLE_VERSION: &str = "heidecke-1";

/// Heidecke deterioration fractions for grades A..H.
///
/// A new, B between new and regular, C regular, D between regular and simple
/// repairs, E simple repairs, F between simple and important repairs,
/// G important repairs, H beyond repair.
pub const HEIDECKE_COEFFICIENTS: [Decimal; 8] = [
    dec!(0.0000),
    dec!(0.0032),
    dec!(0.0252),
    dec!(0.0809),
    dec!(0.1810),
    dec!(0.3320),
    dec!(0.5260),
    dec!(1.0000),
];
