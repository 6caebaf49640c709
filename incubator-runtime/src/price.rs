//! Square-root price encoding used by concentrated-liquidity pools.
//!
//! Pools store `sqrt(price) * 2^96` as a `uint160`; the initializer must
//! produce exactly that value or the pool starts at the wrong price.

use alloy::primitives::U256;

use crate::error::IncubatorError;

/// Fractional scale of the square-root price (`2^96`).
pub const Q96_BITS: usize = 96;

/// Lowest representable sqrt price plus one (swap price limit for zero-for-one).
pub const MIN_SQRT_PRICE_LIMIT: u64 = 4_295_128_740;

/// Highest representable sqrt price minus one (swap price limit for one-for-zero).
pub fn max_sqrt_price_limit() -> U256 {
    // 1461446703485210103287273052203988822378723970341
    U256::from_limbs([0x5d951d5263988d25, 0xefd1fc6a50648849, 0xfffd8963, 0])
}

pub fn q96() -> U256 {
    U256::from(1u64) << Q96_BITS
}

/// `floor(sqrt(price) * 2^96)`.
pub fn price_to_sqrt_price_x96(price: f64) -> Result<U256, IncubatorError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(IncubatorError::InvalidPrice(format!("{price} is not a positive price")));
    }
    let scaled = (price.sqrt() * 2f64.powi(Q96_BITS as i32)).floor();
    let value = f64_to_u256(scaled)?;
    if value.bit_len() > 160 {
        return Err(IncubatorError::InvalidPrice(format!(
            "{price} exceeds the uint160 sqrt price range"
        )));
    }
    if value.is_zero() {
        return Err(IncubatorError::InvalidPrice(format!("{price} underflows to zero")));
    }
    Ok(value)
}

/// `(sqrtPriceX96 / 2^96)^2`.
pub fn sqrt_price_to_price(sqrt_price_x96: U256) -> f64 {
    let sqrt = u256_to_f64(sqrt_price_x96) / 2f64.powi(Q96_BITS as i32);
    sqrt * sqrt
}

/// Exact conversion of a non-negative integral f64.
fn f64_to_u256(value: f64) -> Result<U256, IncubatorError> {
    if value < 9_007_199_254_740_992.0 {
        return Ok(U256::from(value as u64));
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i64 - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    let shift = usize::try_from(exponent)
        .map_err(|_| IncubatorError::InvalidPrice(format!("cannot represent {value}")))?;
    if shift + 53 > 256 {
        return Err(IncubatorError::InvalidPrice(format!("{value} overflows 256 bits")));
    }
    Ok(U256::from(mantissa) << shift)
}

pub(crate) fn u256_to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, limb)| acc + (*limb as f64) * 2f64.powi(64 * i as i32))
}
