//! Pure transaction builders, one family per target system.
//!
//! Every builder validates its inputs, converts amounts to base units and
//! ABI-encodes a call. None of them touch the network.

pub mod buyback;
pub mod identity;
pub mod incubation;
pub mod pool;
pub mod treasury;

use alloy::primitives::{Address, Bytes, U256};
use serde::de::DeserializeOwned;

use crate::chain::Chain;
use crate::error::IncubatorError;
use crate::types::PreparedTx;

/// Decode a JSON intent into a builder's typed parameters.
pub(crate) fn parse_intent<T: DeserializeOwned>(
    tool: &str,
    intent: &serde_json::Value,
) -> Result<T, IncubatorError> {
    serde_json::from_value(intent.clone()).map_err(|e| IncubatorError::intent(tool, e.to_string()))
}

pub(crate) fn prepared(
    to: Address,
    data: Vec<u8>,
    chain: Chain,
    description: impl Into<String>,
) -> PreparedTx {
    let data = Bytes::from(data);
    tracing::debug!(to = %to, chain = %chain, bytes = data.len(), "encoded call");
    PreparedTx {
        to,
        data,
        value: U256::ZERO,
        chain_id: chain.id(),
        description: description.into(),
    }
}

/// Builders never emit a zero-amount transfer.
pub(crate) fn nonzero(amount: U256, input: &str) -> Result<U256, IncubatorError> {
    if amount.is_zero() {
        return Err(IncubatorError::InvalidAmount(format!("'{input}' is zero")));
    }
    Ok(amount)
}
