//! Numeric conversions with proper decimal handling.
//!
//! Raw on-chain integers (uint112 reserves, uint256 share amounts) can
//! exceed 2^53, so every conversion goes through BigDecimal instead of a
//! direct float cast.

use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use once_cell::sync::Lazy;

/// Convert a raw u128 reserve value to f64, adjusted by `10^decimals`.
///
/// Returns 0.0 if the adjusted value cannot be represented as a finite
/// f64.
pub fn reserve_to_f64(reserve: u128, decimals: u8) -> f64 {
    let big_value = BigDecimal::from(reserve);

    let adjusted = if decimals == 0 { big_value } else { big_value / big_pow10(decimals) };

    adjusted.to_f64().unwrap_or(0.0)
}

/// Ratio of two U256 values as f64.
///
/// Returns None for a zero denominator or a non-finite result.
pub fn u256_ratio(numerator: U256, denominator: U256) -> Option<f64> {
    if denominator.is_zero() {
        return None;
    }

    let numerator = u256_to_bigdecimal(numerator);
    let denominator = u256_to_bigdecimal(denominator);

    let result = (numerator / denominator).to_f64()?;

    if result.is_finite() {
        Some(result)
    } else {
        None
    }
}

fn u256_to_bigdecimal(value: U256) -> BigDecimal {
    // Via little-endian bytes, faster than string parsing
    let bytes: [u8; 32] = value.to_le_bytes();
    let big_int = BigInt::from_bytes_le(num_bigint::Sign::Plus, &bytes);
    BigDecimal::from(big_int)
}

static POW10_CACHE: Lazy<[BigDecimal; 25]> =
    Lazy::new(|| std::array::from_fn(|i| BigDecimal::from(BigInt::from(10u32).pow(i as u32))));

/// Compute 10^exp as BigDecimal.
fn big_pow10(exp: u8) -> BigDecimal {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigDecimal::from(BigInt::from(10u32).pow(exp as u32))
    }
}
