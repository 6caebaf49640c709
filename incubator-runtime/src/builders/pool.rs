//! Pool initialization, swaps and liquidity locking.

use alloy::primitives::aliases::U160;
use alloy::primitives::{Address, B256, Bytes, I256, U256};
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};

use super::{nonzero, prepared};
use crate::amounts::{TOKEN_DECIMALS, from_base_units, to_base_units};
use crate::chain::{Chain, ChainRef};
use crate::contracts::{IAntiRugHook, IPoolManager, SwapParams};
use crate::error::IncubatorError;
use crate::pool_key::{PoolKey, canonical_pool_key, short_address};
use crate::price::{MIN_SQRT_PRICE_LIMIT, max_sqrt_price_limit, price_to_sqrt_price_x96};
use crate::types::{PreparedTx, ReadCall};

/// Seconds per vesting month.
pub const MONTH_SECONDS: u64 = 30 * 24 * 60 * 60;

pub const MIN_VESTING_MONTHS: u32 = 6;
pub const MAX_VESTING_MONTHS: u32 = 48;

#[derive(Debug, Clone, Deserialize)]
pub struct PoolIntent {
    pub token_a: Address,
    pub token_b: Address,
    #[serde(default)]
    pub fee: Option<u32>,
    #[serde(default)]
    pub hooks: Option<Address>,
    /// Price of `currency_low` in `currency_high`.
    pub initial_price: f64,
    #[serde(default)]
    pub chain: Option<ChainRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapIntent {
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: String,
    #[serde(default)]
    pub decimals_in: Option<u8>,
    #[serde(default)]
    pub fee: Option<u32>,
    #[serde(default)]
    pub hooks: Option<Address>,
    #[serde(default)]
    pub chain: Option<ChainRef>,
}

/// On-chain vesting state for a locked pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VestingStatus {
    pub initialized: bool,
    pub founder: Address,
    pub total_locked: U256,
    pub vested: U256,
    pub released: U256,
    pub available: U256,
    pub time_until_fully_vested: U256,
}

pub fn initialize_pool(
    key: &PoolKey,
    initial_price: f64,
    pool_manager: Address,
    chain: Chain,
) -> Result<PreparedTx, IncubatorError> {
    let sqrt_price = price_to_sqrt_price_x96(initial_price)?;
    let call = IPoolManager::initializeCall {
        key: key.to_sol(),
        sqrtPriceX96: to_u160(sqrt_price)?,
    };
    Ok(prepared(
        pool_manager,
        call.abi_encode(),
        chain,
        format!("Initialize pool: {key}"),
    ))
}

/// Exact-input swap. Direction follows from which canonical currency is
/// sold; the price limit is the far end of the range in that direction.
pub fn execute_swap(
    key: &PoolKey,
    token_in: Address,
    amount_in: U256,
    pool_manager: Address,
    chain: Chain,
) -> Result<PreparedTx, IncubatorError> {
    let zero_for_one = key.zero_for_one(token_in)?;
    // negative amountSpecified means exact input
    let amount_specified = I256::try_from(amount_in)
        .ok()
        .and_then(|a| a.checked_neg())
        .ok_or_else(|| IncubatorError::InvalidAmount(format!("{amount_in} exceeds int256")))?;
    let limit = if zero_for_one {
        U256::from(MIN_SQRT_PRICE_LIMIT)
    } else {
        max_sqrt_price_limit()
    };
    let token_out = if zero_for_one {
        key.currency_high
    } else {
        key.currency_low
    };

    let call = IPoolManager::swapCall {
        key: key.to_sol(),
        params: SwapParams {
            zeroForOne: zero_for_one,
            amountSpecified: amount_specified,
            sqrtPriceLimitX96: to_u160(limit)?,
        },
        hookData: Bytes::new(),
    };
    Ok(prepared(
        pool_manager,
        call.abi_encode(),
        chain,
        format!(
            "Swap {amount_in} base units of {} for {}",
            short_address(&token_in),
            short_address(&token_out)
        ),
    ))
}

pub fn compute_pool_id(key: &PoolKey) -> B256 {
    key.id()
}

/// Lock liquidity behind the anti-rug hook: no cliff, linear vesting over
/// `vesting_months` thirty-day months.
pub fn initialize_vesting(
    key: &PoolKey,
    founder: Address,
    vesting_months: u32,
    total_locked: U256,
    hook: Address,
    chain: Chain,
) -> Result<PreparedTx, IncubatorError> {
    if !(MIN_VESTING_MONTHS..=MAX_VESTING_MONTHS).contains(&vesting_months) {
        return Err(IncubatorError::InvalidVestingPeriod(vesting_months));
    }
    if total_locked.is_zero() {
        return Err(IncubatorError::InvalidAmount("nothing to lock".into()));
    }
    let call = IAntiRugHook::initializeVestingCall {
        key: key.to_sol(),
        founder,
        cliffDuration: U256::ZERO,
        vestingDuration: U256::from(u64::from(vesting_months) * MONTH_SECONDS),
        totalLocked: total_locked,
    };
    Ok(prepared(
        hook,
        call.abi_encode(),
        chain,
        format!(
            "Lock {} tokens in {key} for {vesting_months} months",
            from_base_units(total_locked, TOKEN_DECIMALS)
        ),
    ))
}

pub fn vesting_status_call(key: &PoolKey, hook: Address) -> ReadCall {
    let call = IAntiRugHook::getVestingStatusCall { key: key.to_sol() };
    ReadCall {
        to: hook,
        data: call.abi_encode().into(),
    }
}

pub fn decode_vesting_status(data: &[u8]) -> Result<VestingStatus, IncubatorError> {
    let ret = IAntiRugHook::getVestingStatusCall::abi_decode_returns(data)?;
    Ok(VestingStatus {
        initialized: ret.initialized,
        founder: ret.founder,
        total_locked: ret.totalLocked,
        vested: ret.vested,
        released: ret.released,
        available: ret.available,
        time_until_fully_vested: ret.timeUntilFullyVested,
    })
}

/// Build a pool initialization from a loosely-typed intent.
pub fn initialize_pool_from_intent(
    intent: &PoolIntent,
    default_fee: u32,
    pool_manager: Address,
    chain: Chain,
) -> Result<PreparedTx, IncubatorError> {
    let key = canonical_pool_key(
        intent.token_a,
        intent.token_b,
        intent.fee.unwrap_or(default_fee),
        intent.hooks,
    )?;
    initialize_pool(
        &key,
        intent.initial_price,
        pool_manager,
        chain,
    )
}

pub fn execute_swap_from_intent(
    intent: &SwapIntent,
    default_fee: u32,
    pool_manager: Address,
    chain: Chain,
) -> Result<PreparedTx, IncubatorError> {
    let key = canonical_pool_key(
        intent.token_in,
        intent.token_out,
        intent.fee.unwrap_or(default_fee),
        intent.hooks,
    )?;
    let decimals = intent.decimals_in.unwrap_or(TOKEN_DECIMALS);
    let amount = nonzero(to_base_units(&intent.amount_in, decimals)?, &intent.amount_in)?;
    execute_swap(
        &key,
        intent.token_in,
        amount,
        pool_manager,
        chain,
    )
}

fn to_u160(value: U256) -> Result<U160, IncubatorError> {
    U160::checked_from_uint(value)
        .ok_or_else(|| IncubatorError::InvalidPrice(format!("{value} exceeds uint160")))
}
