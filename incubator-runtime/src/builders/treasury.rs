//! USDC transfers, allowances, budget disbursement and cross-chain bridging.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};

use super::{nonzero, prepared};
use crate::amounts::{USDC_DECIMALS, from_base_units, to_base_units};
use crate::chain::{Chain, ChainRef};
use crate::contracts::{IERC20, ITokenMessenger};
use crate::error::IncubatorError;
use crate::pool_key::short_address;
use crate::types::{PreparedTx, ReadCall};

#[derive(Debug, Clone, Deserialize)]
pub struct TransferIntent {
    pub to: Address,
    pub amount: String,
    #[serde(default)]
    pub chain: Option<ChainRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApproveIntent {
    pub spender: Address,
    pub amount: String,
    #[serde(default)]
    pub chain: Option<ChainRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeIntent {
    pub amount: String,
    pub source_chain: ChainRef,
    pub dest_chain: ChainRef,
    pub recipient: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisburseIntent {
    pub squad: Address,
    pub amount: String,
    pub memo: String,
    #[serde(default)]
    pub chain: Option<ChainRef>,
}

/// Bridge cost breakdown, all amounts in USDC base units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeEstimate {
    pub amount: U256,
    pub fee: U256,
    pub net_amount: U256,
    pub estimated_minutes: u32,
}

/// Decoded token balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceResult {
    pub raw: U256,
    pub formatted: String,
}

pub fn transfer_usdc(to: Address, amount: &str, chain: Chain) -> Result<PreparedTx, IncubatorError> {
    let units = nonzero(to_base_units(amount, USDC_DECIMALS)?, amount)?;
    let call = IERC20::transferCall { to, amount: units };
    Ok(prepared(
        chain.usdc(),
        call.abi_encode(),
        chain,
        format!(
            "Transfer {} USDC to {}",
            from_base_units(units, USDC_DECIMALS),
            short_address(&to)
        ),
    ))
}

/// Allowance grant; must be confirmed before the spender pulls funds.
pub fn approve_usdc(
    spender: Address,
    amount: &str,
    chain: Chain,
) -> Result<PreparedTx, IncubatorError> {
    let units = to_base_units(amount, USDC_DECIMALS)?;
    let call = IERC20::approveCall { spender, amount: units };
    Ok(prepared(
        chain.usdc(),
        call.abi_encode(),
        chain,
        format!(
            "Approve {} USDC for {}",
            from_base_units(units, USDC_DECIMALS),
            short_address(&spender)
        ),
    ))
}

/// Burn USDC on `source` for minting to `recipient` on `dest`.
///
/// The token messenger must already hold an allowance for `amount`.
pub fn bridge_usdc(
    amount: &str,
    source: Chain,
    dest: Chain,
    recipient: Address,
) -> Result<PreparedTx, IncubatorError> {
    if source == dest {
        return Err(IncubatorError::intent(
            "bridge_usdc",
            format!("source and destination are both {source}"),
        ));
    }
    let messenger = source
        .token_messenger()
        .ok_or_else(|| IncubatorError::UnsupportedChain(format!("{source} (no bridge)")))?;
    let dest_domain = dest
        .bridge_domain()
        .ok_or_else(|| IncubatorError::UnsupportedChain(format!("{dest} (no bridge)")))?;
    let units = nonzero(to_base_units(amount, USDC_DECIMALS)?, amount)?;

    let call = ITokenMessenger::depositForBurnCall {
        amount: units,
        destinationDomain: dest_domain,
        mintRecipient: recipient.into_word(),
        burnToken: source.usdc(),
    };
    Ok(prepared(
        messenger,
        call.abi_encode(),
        source,
        format!(
            "Bridge {} USDC from {source} to {dest}",
            from_base_units(units, USDC_DECIMALS)
        ),
    ))
}

/// Treasury payout to a squad wallet.
pub fn disburse_budget(
    squad: Address,
    amount: &str,
    memo: &str,
    chain: Chain,
) -> Result<PreparedTx, IncubatorError> {
    let mut tx = transfer_usdc(squad, amount, chain)?;
    let units = to_base_units(amount, USDC_DECIMALS)?;
    tx.description = format!(
        "Disburse {} USDC to squad: {memo}",
        from_base_units(units, USDC_DECIMALS)
    );
    Ok(tx)
}

/// The bridge charges no protocol fee; the net amount equals the input.
pub fn estimate_bridge_fee(
    amount: &str,
    source: Chain,
    dest: Chain,
) -> Result<BridgeEstimate, IncubatorError> {
    if source.bridge_domain().is_none() {
        return Err(IncubatorError::UnsupportedChain(format!("{source} (no bridge)")));
    }
    if dest.bridge_domain().is_none() {
        return Err(IncubatorError::UnsupportedChain(format!("{dest} (no bridge)")));
    }
    let units = to_base_units(amount, USDC_DECIMALS)?;
    // attestation latency: mainnet finality dominates
    let estimated_minutes = if source == Chain::Ethereum { 15 } else { 1 };
    Ok(BridgeEstimate {
        amount: units,
        fee: U256::ZERO,
        net_amount: units,
        estimated_minutes,
    })
}

pub fn usdc_balance_call(account: Address, chain: Chain) -> ReadCall {
    let call = IERC20::balanceOfCall { account };
    ReadCall {
        to: chain.usdc(),
        data: call.abi_encode().into(),
    }
}

pub fn decode_balance(data: &[u8]) -> Result<BalanceResult, IncubatorError> {
    let raw = IERC20::balanceOfCall::abi_decode_returns(data)?;
    Ok(BalanceResult {
        raw,
        formatted: from_base_units(raw, USDC_DECIMALS),
    })
}
