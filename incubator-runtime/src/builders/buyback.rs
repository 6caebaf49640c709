//! Treasury buyback-and-burn: swap USDC for the governance token and burn it.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};

use super::treasury::approve_usdc;
use super::{nonzero, prepared};
use crate::amounts::{TOKEN_DECIMALS, USDC_DECIMALS, from_base_units, min_output, to_base_units};
use crate::chain::{Chain, ChainRef};
use crate::contracts::IBuyback;
use crate::error::IncubatorError;
use crate::price::u256_to_f64;
use crate::types::{PreparedTx, ReadCall};

#[derive(Debug, Clone, Deserialize)]
pub struct BuybackIntent {
    pub usdc_amount: String,
    /// Minimum tokens to receive, in whole tokens.
    #[serde(default)]
    pub min_out: Option<String>,
    /// Quoted output in whole tokens; the minimum is derived with `slippage_bps`.
    #[serde(default)]
    pub expected_out: Option<String>,
    #[serde(default)]
    pub slippage_bps: Option<u32>,
    #[serde(default)]
    pub chain: Option<ChainRef>,
}

impl BuybackIntent {
    /// Resolve the minimum output bound in base units. The caller is
    /// responsible for the freshness of any quote supplied here.
    pub fn min_out_units(&self, default_slippage_bps: u32) -> Result<U256, IncubatorError> {
        match (&self.min_out, &self.expected_out) {
            (Some(min), _) => to_base_units(min, TOKEN_DECIMALS),
            (None, Some(expected)) => min_output(
                to_base_units(expected, TOKEN_DECIMALS)?,
                self.slippage_bps.unwrap_or(default_slippage_bps),
            ),
            (None, None) => Err(IncubatorError::intent(
                "execute_buyback",
                "either min_out or expected_out is required",
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuybackEstimate {
    pub usdc_in: U256,
    pub tokens_out: U256,
    /// USDC paid per whole token.
    pub effective_price: f64,
    /// Percent above the spot price.
    pub price_impact_pct: f64,
}

/// Requires a prior USDC allowance to the buyback contract.
pub fn execute_buyback(
    buyback: Address,
    usdc_amount: &str,
    min_out: U256,
    chain: Chain,
) -> Result<PreparedTx, IncubatorError> {
    let units = nonzero(to_base_units(usdc_amount, USDC_DECIMALS)?, usdc_amount)?;
    let call = IBuyback::executeBuybackCall {
        usdcAmount: units,
        minConsulOut: min_out,
    };
    Ok(prepared(
        buyback,
        call.abi_encode(),
        chain,
        format!(
            "Buyback: swap {} USDC for at least {} tokens, then burn",
            from_base_units(units, USDC_DECIMALS),
            from_base_units(min_out, TOKEN_DECIMALS)
        ),
    ))
}

/// `[approve, executeBuyback]`. The approval must be confirmed before the
/// buyback is submitted.
pub fn buyback_with_approval(
    buyback: Address,
    usdc_amount: &str,
    min_out: U256,
    chain: Chain,
) -> Result<Vec<PreparedTx>, IncubatorError> {
    let execute = execute_buyback(buyback, usdc_amount, min_out, chain)?;
    let approve = approve_usdc(buyback, usdc_amount, chain)?;
    Ok(vec![approve, execute])
}

pub fn buyback_quote_call(buyback: Address, usdc_amount: U256) -> ReadCall {
    let call = IBuyback::getQuoteCall { usdcAmount: usdc_amount };
    ReadCall {
        to: buyback,
        data: call.abi_encode().into(),
    }
}

pub fn decode_quote(data: &[u8]) -> Result<U256, IncubatorError> {
    Ok(IBuyback::getQuoteCall::abi_decode_returns(data)?)
}

pub fn total_burned_call(buyback: Address) -> ReadCall {
    ReadCall {
        to: buyback,
        data: IBuyback::totalBurnedCall {}.abi_encode().into(),
    }
}

pub fn decode_total_burned(data: &[u8]) -> Result<U256, IncubatorError> {
    Ok(IBuyback::totalBurnedCall::abi_decode_returns(data)?)
}

/// Effective price and impact of a quoted buyback against the spot price.
pub fn estimate_buyback(
    usdc_in: U256,
    tokens_out: U256,
    spot_price: f64,
) -> Result<BuybackEstimate, IncubatorError> {
    if tokens_out.is_zero() {
        return Err(IncubatorError::InvalidAmount("quote returned zero tokens".into()));
    }
    if !spot_price.is_finite() || spot_price <= 0.0 {
        return Err(IncubatorError::InvalidPrice(format!("spot price {spot_price}")));
    }
    let scale = 10f64.powi(i32::from(TOKEN_DECIMALS - USDC_DECIMALS));
    let effective_price = u256_to_f64(usdc_in) / u256_to_f64(tokens_out) * scale;
    let price_impact_pct = (effective_price - spot_price) / spot_price * 100.0;
    Ok(BuybackEstimate {
        usdc_in,
        tokens_out,
        effective_price,
        price_impact_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::IERC20;
    use alloy::primitives::address;
    use alloy::sol_types::SolValue;

    const BUYBACK: Address = address!("00000000000000000000000000000000000000bb");

    fn tokens(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[test]
    fn test_buyback_with_approval_order() {
        let txs = buyback_with_approval(BUYBACK, "$5,000", tokens(400_000), Chain::Base).unwrap();
        assert_eq!(txs.len(), 2);

        assert_eq!(txs[0].to, Chain::Base.usdc());
        assert_eq!(txs[0].selector(), Some(IERC20::approveCall::SELECTOR));
        let approve = IERC20::approveCall::abi_decode(&txs[0].data).unwrap();
        assert_eq!(approve.spender, BUYBACK);
        assert_eq!(approve.amount, U256::from(5_000_000_000u64));

        assert_eq!(txs[1].to, BUYBACK);
        assert_eq!(txs[1].selector(), Some(IBuyback::executeBuybackCall::SELECTOR));
        let exec = IBuyback::executeBuybackCall::abi_decode(&txs[1].data).unwrap();
        assert_eq!(exec.usdcAmount, U256::from(5_000_000_000u64));
        assert_eq!(exec.minConsulOut, tokens(400_000));
    }

    #[test]
    fn test_buyback_rejects_bad_amount() {
        assert!(matches!(
            buyback_with_approval(BUYBACK, "free", U256::ZERO, Chain::Base),
            Err(IncubatorError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_min_out_from_expected() {
        let intent = BuybackIntent {
            usdc_amount: "1000".into(),
            min_out: None,
            expected_out: Some("1000".into()),
            slippage_bps: Some(50),
            chain: None,
        };
        assert_eq!(intent.min_out_units(100).unwrap(), tokens(995));

        let explicit = BuybackIntent {
            min_out: Some("900".into()),
            ..intent.clone()
        };
        assert_eq!(explicit.min_out_units(100).unwrap(), tokens(900));

        let neither = BuybackIntent {
            min_out: None,
            expected_out: None,
            ..intent
        };
        assert!(matches!(
            neither.min_out_units(50),
            Err(IncubatorError::InvalidIntent { .. })
        ));
    }

    #[test]
    fn test_read_calls() {
        let quote = buyback_quote_call(BUYBACK, U256::from(1_000_000u64));
        assert_eq!(quote.to, BUYBACK);
        assert_eq!(&quote.data[..4], &IBuyback::getQuoteCall::SELECTOR);
        assert_eq!(decode_quote(&tokens(3).abi_encode()).unwrap(), tokens(3));

        let burned = total_burned_call(BUYBACK);
        assert_eq!(burned.data.len(), 4);
        assert_eq!(decode_total_burned(&tokens(7).abi_encode()).unwrap(), tokens(7));
    }

    #[test]
    fn test_estimate_buyback() {
        // 1,000 USDC buys 10,000 tokens: 0.1 USDC each against a 0.08 spot
        let est = estimate_buyback(U256::from(1_000_000_000u64), tokens(10_000), 0.08).unwrap();
        assert!((est.effective_price - 0.1).abs() < 1e-12);
        assert!((est.price_impact_pct - 25.0).abs() < 1e-9);
        assert!(estimate_buyback(U256::from(1u64), U256::ZERO, 1.0).is_err());
    }
}
