//! Order-independent pool identity.

use std::fmt;

use alloy::primitives::aliases::{I24, U24};
use alloy::primitives::{Address, B256, keccak256};
use alloy::sol_types::SolValue;
use serde::{Deserialize, Serialize};

use crate::contracts;
use crate::error::IncubatorError;

/// Supported fee tiers, in hundredths of a basis point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FeeTier {
    /// 0.05%
    Low,
    /// 0.3%
    Medium,
    /// 1%
    High,
}

impl FeeTier {
    pub fn fee(&self) -> u32 {
        match self {
            FeeTier::Low => 500,
            FeeTier::Medium => 3000,
            FeeTier::High => 10_000,
        }
    }

    pub fn tick_spacing(&self) -> i32 {
        match self {
            FeeTier::Low => 10,
            FeeTier::Medium => 60,
            FeeTier::High => 200,
        }
    }

    /// Human percentage, e.g. `0.3%`.
    pub fn percent_label(&self) -> String {
        format!("{}%", f64::from(self.fee()) / 10_000.0)
    }
}

impl TryFrom<u32> for FeeTier {
    type Error = IncubatorError;

    fn try_from(fee: u32) -> Result<Self, Self::Error> {
        match fee {
            500 => Ok(FeeTier::Low),
            3000 => Ok(FeeTier::Medium),
            10_000 => Ok(FeeTier::High),
            other => Err(IncubatorError::UnsupportedFeeTier(other)),
        }
    }
}

impl From<FeeTier> for u32 {
    fn from(tier: FeeTier) -> Self {
        tier.fee()
    }
}

/// A token pair in canonical form: `currency_low < currency_high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub currency_low: Address,
    pub currency_high: Address,
    pub fee: FeeTier,
    pub tick_spacing: i32,
    /// Zero address when the pool has no hook.
    pub hooks: Address,
}

/// Build the canonical key for a pair; the result does not depend on the
/// order `a` and `b` are given in.
pub fn canonical_pool_key(
    a: Address,
    b: Address,
    fee: u32,
    hooks: Option<Address>,
) -> Result<PoolKey, IncubatorError> {
    let fee = FeeTier::try_from(fee)?;
    if a == b {
        return Err(IncubatorError::IdenticalCurrencies);
    }
    let (currency_low, currency_high) = if a < b { (a, b) } else { (b, a) };
    Ok(PoolKey {
        currency_low,
        currency_high,
        fee,
        tick_spacing: fee.tick_spacing(),
        hooks: hooks.unwrap_or(Address::ZERO),
    })
}

impl PoolKey {
    pub fn to_sol(&self) -> contracts::PoolKey {
        contracts::PoolKey {
            currency0: self.currency_low,
            currency1: self.currency_high,
            fee: U24::from(self.fee.fee()),
            tickSpacing: I24::try_from(self.tick_spacing).unwrap_or(I24::ZERO),
            hooks: self.hooks,
        }
    }

    /// `keccak256(abi.encode(key))`, the identifier the pool manager assigns.
    pub fn id(&self) -> B256 {
        keccak256(self.to_sol().abi_encode())
    }

    /// Swap direction for an input token: `true` when selling `currency_low`.
    pub fn zero_for_one(&self, token_in: Address) -> Result<bool, IncubatorError> {
        if token_in == self.currency_low {
            Ok(true)
        } else if token_in == self.currency_high {
            Ok(false)
        } else {
            Err(IncubatorError::intent(
                "execute_swap",
                format!("token {token_in} is not part of the pool"),
            ))
        }
    }

    pub fn contains(&self, token: Address) -> bool {
        token == self.currency_low || token == self.currency_high
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({} fee)",
            short_address(&self.currency_low),
            short_address(&self.currency_high),
            self.fee.percent_label()
        )
    }
}

/// `0x1234…abcd` style abbreviation for descriptions.
pub fn short_address(addr: &Address) -> String {
    let hex = addr.to_string();
    format!("{}...{}", &hex[..6], &hex[hex.len() - 4..])
}
