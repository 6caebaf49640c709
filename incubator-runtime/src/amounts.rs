//! Fixed-point conversions between human-entered decimal strings and integer
//! base units, plus slippage bounds.

use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::IncubatorError;

/// USDC and other stablecoins.
pub const USDC_DECIMALS: u8 = 6;
/// Project tokens.
pub const TOKEN_DECIMALS: u8 = 18;

pub const BPS_DENOMINATOR: u32 = 10_000;

/// Larger scales cannot be represented in 256 bits for any non-trivial amount.
const MAX_DECIMALS: u8 = 60;

/// Parse a human-entered amount such as `"$10,000"` or `"1.5 USDC"`.
///
/// Everything except ASCII digits and `.` is discarded before parsing.
pub fn parse_human_amount(input: &str) -> Result<Decimal, IncubatorError> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return Err(IncubatorError::InvalidAmount(format!(
            "'{input}' contains no digits"
        )));
    }
    Decimal::from_str(&cleaned)
        .map_err(|e| IncubatorError::InvalidAmount(format!("'{input}': {e}")))
}

/// Convert a decimal string to integer base units at `decimals` precision,
/// rounding half away from zero at the last representable digit.
pub fn to_base_units(input: &str, decimals: u8) -> Result<U256, IncubatorError> {
    let value = parse_human_amount(input)?;
    decimal_to_base_units(value, decimals)
}

/// Same as [`to_base_units`] for an already-parsed value.
pub fn decimal_to_base_units(value: Decimal, decimals: u8) -> Result<U256, IncubatorError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(IncubatorError::InvalidAmount(format!(
            "negative amount {value}"
        )));
    }
    if decimals > MAX_DECIMALS {
        return Err(IncubatorError::InvalidAmount(format!(
            "unsupported precision: {decimals} decimals"
        )));
    }

    let rounded =
        value.round_dp_with_strategy(u32::from(decimals), RoundingStrategy::MidpointAwayFromZero);
    // round_dp never leaves more fractional digits than requested
    let missing = u32::from(decimals) - rounded.scale();
    let mantissa = U256::from(rounded.mantissa().unsigned_abs());
    let scale = U256::from(10u64)
        .checked_pow(U256::from(missing))
        .ok_or_else(|| IncubatorError::InvalidAmount(format!("{value} overflows")))?;

    mantissa
        .checked_mul(scale)
        .ok_or_else(|| IncubatorError::InvalidAmount(format!("{value} overflows")))
}

/// Render base units as a plain decimal string without trailing zeros.
/// Display only; never fed back into encoding.
pub fn from_base_units(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let d = usize::from(decimals);
    if d == 0 {
        return digits;
    }

    let padded = if digits.len() <= d {
        format!("{}{}", "0".repeat(d + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - d);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

/// Minimum acceptable output for a slippage tolerance in basis points.
///
/// Integer division truncates so the bound never rounds in the caller's favor.
pub fn min_output(expected_output: U256, slippage_bps: u32) -> Result<U256, IncubatorError> {
    if slippage_bps > BPS_DENOMINATOR {
        return Err(IncubatorError::InvalidSlippage(slippage_bps));
    }
    let keep = U256::from(BPS_DENOMINATOR - slippage_bps);
    let scaled = expected_output
        .checked_mul(keep)
        .ok_or_else(|| IncubatorError::InvalidAmount("expected output overflows".into()))?;
    Ok(scaled / U256::from(BPS_DENOMINATOR))
}

/// US-dollar display with thousands separators, e.g. `$10,000.00`.
pub fn format_usd(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}

/// USDC base units rendered as dollars.
pub fn format_usdc(amount: U256) -> String {
    match Decimal::from_str(&from_base_units(amount, USDC_DECIMALS)) {
        Ok(d) => format_usd(d),
        Err(_) => format!("{} USDC", from_base_units(amount, USDC_DECIMALS)),
    }
}
