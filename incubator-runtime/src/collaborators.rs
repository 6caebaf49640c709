//! Interfaces to the systems outside the core: the signer/submitter, the
//! contract read interface and the identity resolver.
//!
//! The engine only consumes these traits. [`RpcContractReader`] and
//! [`RegistryIdentityResolver`] are the stock implementations over a
//! JSON-RPC endpoint; signing is always supplied by the host.

use std::sync::Arc;

use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use async_trait::async_trait;

use crate::builders::buyback::{
    buyback_quote_call, decode_quote, decode_total_burned, total_burned_call,
};
use crate::builders::identity::{decode_owner, owner_call};
use crate::builders::treasury::{BalanceResult, decode_balance, usdc_balance_call};
use crate::chain::Chain;
use crate::error::IncubatorError;
use crate::types::{PreparedTx, ReadCall};

/// Hands prepared transactions to a wallet and reports their fate.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit for signing and broadcast; returns the transaction hash.
    async fn submit(&self, tx: &PreparedTx) -> Result<String, IncubatorError>;

    /// Resolve once the transaction is mined. A revert is an `Err`.
    async fn await_confirmation(&self, tx_hash: &str) -> Result<(), IncubatorError>;
}

/// View-only contract calls.
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn call(&self, call: &ReadCall) -> Result<Bytes, IncubatorError>;
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Whether the fully-qualified name can still be registered.
    async fn is_available(&self, name: &str) -> Result<bool, IncubatorError>;
}

#[async_trait]
impl<T: ContractReader + ?Sized> ContractReader for Arc<T> {
    async fn call(&self, call: &ReadCall) -> Result<Bytes, IncubatorError> {
        (**self).call(call).await
    }
}

/// `eth_call` against a JSON-RPC endpoint.
pub struct RpcContractReader {
    provider: RootProvider<Ethereum>,
}

impl RpcContractReader {
    pub fn new(rpc_url: &str) -> Result<Self, IncubatorError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| IncubatorError::ConfigError(format!("Invalid RPC URL: {e}")))?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url);
        Ok(Self { provider })
    }
}

#[async_trait]
impl ContractReader for RpcContractReader {
    async fn call(&self, call: &ReadCall) -> Result<Bytes, IncubatorError> {
        let request = alloy::rpc::types::TransactionRequest::default()
            .to(call.to)
            .input(call.data.clone().into());
        self.provider.call(request).await.map_err(|e| {
            tracing::warn!(to = %call.to, error = %e, "eth_call failed");
            IncubatorError::Rpc(e.to_string())
        })
    }
}

/// A name is available iff the registry reports no owner for it.
pub struct RegistryIdentityResolver<R> {
    reader: R,
    registry: Address,
}

impl<R: ContractReader> RegistryIdentityResolver<R> {
    pub fn new(reader: R, registry: Address) -> Self {
        Self { reader, registry }
    }
}

#[async_trait]
impl<R: ContractReader> IdentityResolver for RegistryIdentityResolver<R> {
    async fn is_available(&self, name: &str) -> Result<bool, IncubatorError> {
        let raw = self.reader.call(&owner_call(name, self.registry)).await?;
        let owner = decode_owner(&raw)?;
        tracing::debug!(name, owner = %owner, "resolved identity owner");
        Ok(owner == Address::ZERO)
    }
}

/// Tokens the buyback contract would return for `usdc_amount` base units.
pub async fn fetch_buyback_quote(
    reader: &dyn ContractReader,
    buyback: Address,
    usdc_amount: U256,
) -> Result<U256, IncubatorError> {
    let raw = reader.call(&buyback_quote_call(buyback, usdc_amount)).await?;
    decode_quote(&raw)
}

pub async fn fetch_usdc_balance(
    reader: &dyn ContractReader,
    account: Address,
    chain: Chain,
) -> Result<BalanceResult, IncubatorError> {
    let raw = reader.call(&usdc_balance_call(account, chain)).await?;
    decode_balance(&raw)
}

pub async fn fetch_total_burned(
    reader: &dyn ContractReader,
    buyback: Address,
) -> Result<U256, IncubatorError> {
    let raw = reader.call(&total_burned_call(buyback)).await?;
    decode_total_burned(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use alloy::sol_types::SolValue;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const BUYBACK: Address = address!("00000000000000000000000000000000000000bb");
    const REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

    /// Answers every `eth_call` with `result`, echoing the request id.
    struct EthCallResult(String);

    impl Respond for EthCallResult {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: serde_json::Value =
                serde_json::from_slice(&request.body).unwrap_or_default();
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": body["id"].clone(),
                "result": self.0,
            }))
        }
    }

    async fn rpc_returning(encoded: Vec<u8>) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_call" })))
            .respond_with(EthCallResult(format!("0x{}", hex::encode(encoded))))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_fetch_buyback_quote_over_rpc() {
        let server = rpc_returning(U256::from(123_456u64).abi_encode()).await;
        let reader = RpcContractReader::new(&server.uri()).unwrap();
        let quote = fetch_buyback_quote(&reader, BUYBACK, U256::from(1_000_000u64))
            .await
            .unwrap();
        assert_eq!(quote, U256::from(123_456u64));
    }

    #[tokio::test]
    async fn test_usdc_balance_over_rpc() {
        let server = rpc_returning(U256::from(2_500_000u64).abi_encode()).await;
        let reader = RpcContractReader::new(&server.uri()).unwrap();
        let balance = fetch_usdc_balance(&reader, BUYBACK, Chain::Base).await.unwrap();
        assert_eq!(balance.formatted, "2.5");
    }

    #[tokio::test]
    async fn test_identity_available_when_unowned() {
        let server = rpc_returning(Address::ZERO.abi_encode()).await;
        let reader = RpcContractReader::new(&server.uri()).unwrap();
        let resolver = RegistryIdentityResolver::new(reader, REGISTRY);
        assert!(resolver.is_available("defi-hub.consul.eth").await.unwrap());
    }

    #[tokio::test]
    async fn test_identity_taken_when_owned() {
        let owner = address!("00000000000000000000000000000000000000f0");
        let server = rpc_returning(owner.abi_encode()).await;
        let reader = Arc::new(RpcContractReader::new(&server.uri()).unwrap());
        let resolver = RegistryIdentityResolver::new(reader, REGISTRY);
        assert!(!resolver.is_available("defi-hub.consul.eth").await.unwrap());
    }

    #[tokio::test]
    async fn test_rpc_error_is_external() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let reader = RpcContractReader::new(&server.uri()).unwrap();
        let err = fetch_total_burned(&reader, BUYBACK).await.unwrap_err();
        assert!(err.is_external());
    }

    #[test]
    fn test_invalid_rpc_url() {
        assert!(matches!(
            RpcContractReader::new("not a url"),
            Err(IncubatorError::ConfigError(_))
        ));
    }
}
