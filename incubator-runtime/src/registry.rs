//! Static tool catalog for agent-driven discovery and invocation.
//!
//! Each entry names a builder, its target-system group and a one-line
//! description. Intents arrive as JSON and are decoded into the builder's
//! typed parameters; a malformed intent is rejected before anything is
//! encoded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builders::buyback::{BuybackIntent, buyback_with_approval, execute_buyback};
use crate::builders::parse_intent;
use crate::builders::pool::{
    PoolIntent, SwapIntent, execute_swap_from_intent, initialize_pool_from_intent,
};
use crate::builders::treasury::{
    ApproveIntent, BridgeIntent, DisburseIntent, TransferIntent, approve_usdc, bridge_usdc,
    disburse_budget, transfer_usdc,
};
use crate::chain::resolve_or;
use crate::config::IncubatorConfig;
use crate::error::IncubatorError;
use crate::types::ToolOutput;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolGroup {
    Treasury,
    Pool,
    Buyback,
}

impl fmt::Display for ToolGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolGroup::Treasury => "treasury",
            ToolGroup::Pool => "pool",
            ToolGroup::Buyback => "buyback",
        };
        f.write_str(s)
    }
}

type BuildFn = fn(&serde_json::Value, &IncubatorConfig) -> Result<ToolOutput, IncubatorError>;

pub struct ToolSpec {
    pub name: &'static str,
    pub group: ToolGroup,
    pub description: &'static str,
    build: BuildFn,
}

/// Discovery entry returned by [`list_tools`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub group: ToolGroup,
    pub description: String,
}

static TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "transfer_usdc",
        group: ToolGroup::Treasury,
        description: "Transfer USDC to an address",
        build: transfer_tool,
    },
    ToolSpec {
        name: "approve_usdc",
        group: ToolGroup::Treasury,
        description: "Approve USDC spending for a contract",
        build: approve_tool,
    },
    ToolSpec {
        name: "bridge_usdc",
        group: ToolGroup::Treasury,
        description: "Bridge USDC cross-chain via burn-and-mint",
        build: bridge_tool,
    },
    ToolSpec {
        name: "disburse_budget",
        group: ToolGroup::Treasury,
        description: "Send USDC from treasury to a squad wallet",
        build: disburse_tool,
    },
    ToolSpec {
        name: "initialize_pool",
        group: ToolGroup::Pool,
        description: "Create a new concentrated-liquidity pool",
        build: initialize_pool_tool,
    },
    ToolSpec {
        name: "execute_swap",
        group: ToolGroup::Pool,
        description: "Swap tokens through the pool manager",
        build: swap_tool,
    },
    ToolSpec {
        name: "execute_buyback",
        group: ToolGroup::Buyback,
        description: "Swap USDC to the governance token and burn it",
        build: buyback_tool,
    },
    ToolSpec {
        name: "buyback_with_approval",
        group: ToolGroup::Buyback,
        description: "Approve + execute buyback in sequence",
        build: buyback_with_approval_tool,
    },
];

pub fn tools() -> &'static [ToolSpec] {
    TOOLS
}

pub fn list_tools() -> Vec<ToolInfo> {
    TOOLS
        .iter()
        .map(|t| ToolInfo {
            name: t.name.to_string(),
            group: t.group,
            description: t.description.to_string(),
        })
        .collect()
}

pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

/// Run a tool's builder against a JSON intent.
pub fn invoke(
    name: &str,
    intent: &serde_json::Value,
    config: &IncubatorConfig,
) -> Result<ToolOutput, IncubatorError> {
    let tool = find_tool(name).ok_or_else(|| IncubatorError::UnknownTool(name.to_string()))?;
    let output = (tool.build)(intent, config);
    match &output {
        Ok(out) => tracing::info!(tool = name, group = %tool.group, transactions = out.len(), "tool invoked"),
        Err(e) => tracing::warn!(tool = name, error = %e, "tool rejected intent"),
    }
    output
}

fn transfer_tool(
    intent: &serde_json::Value,
    config: &IncubatorConfig,
) -> Result<ToolOutput, IncubatorError> {
    let p: TransferIntent = parse_intent("transfer_usdc", intent)?;
    let chain = resolve_or(p.chain.as_ref(), config.chain)?;
    transfer_usdc(p.to, &p.amount, chain).map(ToolOutput::Single)
}

fn approve_tool(
    intent: &serde_json::Value,
    config: &IncubatorConfig,
) -> Result<ToolOutput, IncubatorError> {
    let p: ApproveIntent = parse_intent("approve_usdc", intent)?;
    let chain = resolve_or(p.chain.as_ref(), config.chain)?;
    approve_usdc(p.spender, &p.amount, chain).map(ToolOutput::Single)
}

fn bridge_tool(
    intent: &serde_json::Value,
    _config: &IncubatorConfig,
) -> Result<ToolOutput, IncubatorError> {
    let p: BridgeIntent = parse_intent("bridge_usdc", intent)?;
    let source = p.source_chain.resolve()?;
    let dest = p.dest_chain.resolve()?;
    bridge_usdc(&p.amount, source, dest, p.recipient).map(ToolOutput::Single)
}

fn disburse_tool(
    intent: &serde_json::Value,
    config: &IncubatorConfig,
) -> Result<ToolOutput, IncubatorError> {
    let p: DisburseIntent = parse_intent("disburse_budget", intent)?;
    let chain = resolve_or(p.chain.as_ref(), config.chain)?;
    disburse_budget(p.squad, &p.amount, &p.memo, chain).map(ToolOutput::Single)
}

fn initialize_pool_tool(
    intent: &serde_json::Value,
    config: &IncubatorConfig,
) -> Result<ToolOutput, IncubatorError> {
    let p: PoolIntent = parse_intent("initialize_pool", intent)?;
    let chain = resolve_or(p.chain.as_ref(), config.chain)?;
    let pool_manager = config.pool_manager_on(chain)?;
    initialize_pool_from_intent(&p, config.default_fee_tier, pool_manager, chain)
        .map(ToolOutput::Single)
}

fn swap_tool(
    intent: &serde_json::Value,
    config: &IncubatorConfig,
) -> Result<ToolOutput, IncubatorError> {
    let p: SwapIntent = parse_intent("execute_swap", intent)?;
    let chain = resolve_or(p.chain.as_ref(), config.chain)?;
    let pool_manager = config.pool_manager_on(chain)?;
    execute_swap_from_intent(&p, config.default_fee_tier, pool_manager, chain)
        .map(ToolOutput::Single)
}

fn buyback_tool(
    intent: &serde_json::Value,
    config: &IncubatorConfig,
) -> Result<ToolOutput, IncubatorError> {
    let p: BuybackIntent = parse_intent("execute_buyback", intent)?;
    let chain = resolve_or(p.chain.as_ref(), config.chain)?;
    let min_out = p.min_out_units(config.default_slippage_bps)?;
    execute_buyback(config.buyback_on(chain)?, &p.usdc_amount, min_out, chain)
        .map(ToolOutput::Single)
}

fn buyback_with_approval_tool(
    intent: &serde_json::Value,
    config: &IncubatorConfig,
) -> Result<ToolOutput, IncubatorError> {
    let p: BuybackIntent = parse_intent("buyback_with_approval", intent)?;
    let chain = resolve_or(p.chain.as_ref(), config.chain)?;
    let min_out = p.min_out_units(config.default_slippage_bps)?;
    buyback_with_approval(config.buyback_on(chain)?, &p.usdc_amount, min_out, chain)
        .map(ToolOutput::Sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use crate::config::Deployment;
    use crate::contracts::{IBuyback, IERC20};
    use alloy::primitives::{Address, address};
    use alloy::sol_types::SolCall;
    use serde_json::json;

    const BUYBACK: Address = address!("00000000000000000000000000000000000000bb");

    fn config() -> IncubatorConfig {
        IncubatorConfig {
            deployment: Deployment {
                buyback: Some(BUYBACK),
                ..Deployment::default()
            },
            ..IncubatorConfig::default()
        }
    }

    #[test]
    fn test_catalog_names_unique_and_described() {
        let tools = list_tools();
        assert_eq!(tools.len(), 8);
        for (i, a) in tools.iter().enumerate() {
            assert!(!a.description.is_empty());
            assert!(tools[i + 1..].iter().all(|b| b.name != a.name));
        }
        for group in [ToolGroup::Treasury, ToolGroup::Pool, ToolGroup::Buyback] {
            assert!(tools.iter().any(|t| t.group == group));
        }
    }

    #[test]
    fn test_invoke_transfer() {
        let out = invoke(
            "transfer_usdc",
            &json!({ "to": "0x00000000000000000000000000000000000000aa", "amount": "25" }),
            &config(),
        )
        .unwrap();
        let tx = &out.into_vec()[0];
        assert_eq!(tx.chain_id, config().chain.id());
        assert_eq!(tx.selector(), Some(IERC20::transferCall::SELECTOR));
    }

    #[test]
    fn test_invoke_buyback_sequence() {
        let out = invoke(
            "buyback_with_approval",
            &json!({ "usdc_amount": "$5,000", "expected_out": "50000" }),
            &config(),
        )
        .unwrap();
        let txs = out.into_vec();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].selector(), Some(IERC20::approveCall::SELECTOR));
        assert_eq!(txs[1].selector(), Some(IBuyback::executeBuybackCall::SELECTOR));
    }

    #[test]
    fn test_invoke_errors() {
        assert!(matches!(
            invoke("mint_nft", &json!({}), &config()),
            Err(IncubatorError::UnknownTool(_))
        ));
        assert!(matches!(
            invoke("transfer_usdc", &json!({ "amount": "25" }), &config()),
            Err(IncubatorError::InvalidIntent { .. })
        ));
        assert!(matches!(
            invoke(
                "initialize_pool",
                &json!({
                    "token_a": "0x0000000000000000000000000000000000000001",
                    "token_b": "0x0000000000000000000000000000000000000002",
                    "fee": 250,
                    "initial_price": 1.0
                }),
                &config(),
            ),
            Err(IncubatorError::UnsupportedFeeTier(250))
        ));
        assert!(matches!(
            invoke("execute_buyback", &json!({ "usdc_amount": "10", "min_out": "1" }), &IncubatorConfig::default()),
            Err(IncubatorError::MissingDeployment { .. })
        ));
    }

    #[test]
    fn test_invoke_unsupported_chain() {
        let transfer = |chain: serde_json::Value| {
            invoke(
                "transfer_usdc",
                &json!({ "to": "0x00000000000000000000000000000000000000aa", "amount": "25", "chain": chain }),
                &config(),
            )
        };
        assert!(matches!(
            transfer(json!("solana")),
            Err(IncubatorError::UnsupportedChain(_))
        ));
        assert!(matches!(transfer(json!(56)), Err(IncubatorError::UnsupportedChain(_))));
        assert_eq!(transfer(json!("baseSepolia")).unwrap().into_vec()[0].chain_id, 84532);
        assert_eq!(transfer(json!(8453)).unwrap().into_vec()[0].chain_id, 8453);
        assert!(matches!(
            invoke(
                "bridge_usdc",
                &json!({
                    "amount": "10",
                    "source_chain": "ethereum",
                    "dest_chain": "solana",
                    "recipient": "0x00000000000000000000000000000000000000aa"
                }),
                &config(),
            ),
            Err(IncubatorError::UnsupportedChain(_))
        ));
    }

    #[test]
    fn test_chain_override_targets_that_chains_contracts() {
        let pool = |chain: &str| {
            invoke(
                "initialize_pool",
                &json!({
                    "token_a": "0x0000000000000000000000000000000000000001",
                    "token_b": "0x0000000000000000000000000000000000000002",
                    "initial_price": 1.0,
                    "chain": chain
                }),
                &config(),
            )
        };
        let base = pool("base").unwrap().into_vec().remove(0);
        assert_eq!(base.chain_id, Chain::Base.id());
        assert_eq!(Some(base.to), Chain::Base.pool_manager());

        let default = pool("base_sepolia").unwrap().into_vec().remove(0);
        assert_eq!(Some(default.to), Chain::BaseSepolia.pool_manager());

        assert!(matches!(
            pool("arbitrum"),
            Err(IncubatorError::MissingDeployment { .. })
        ));

        // the configured buyback lives on the configured chain only
        assert!(matches!(
            invoke(
                "execute_buyback",
                &json!({ "usdc_amount": "10", "min_out": "1", "chain": "base" }),
                &config(),
            ),
            Err(IncubatorError::MissingDeployment { .. })
        ));
        let tx = invoke(
            "execute_buyback",
            &json!({ "usdc_amount": "10", "min_out": "1" }),
            &config(),
        )
        .unwrap()
        .into_vec()
        .remove(0);
        assert_eq!(tx.to, BUYBACK);
    }
}
