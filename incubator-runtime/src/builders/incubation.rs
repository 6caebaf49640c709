//! Pipeline actions expressed as prepared transaction sequences.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;

use super::identity::register_identity;
use super::pool::{initialize_pool, initialize_vesting};
use super::treasury::{approve_usdc, transfer_usdc};
use super::{nonzero, prepared};
use crate::amounts::{TOKEN_DECIMALS, USDC_DECIMALS, decimal_to_base_units, from_base_units, to_base_units};
use crate::config::IncubatorConfig;
use crate::contracts::{IChannelCustody, IHubDAO};
use crate::error::IncubatorError;
use crate::pool_key::{PoolKey, canonical_pool_key};
use crate::types::{ActionType, Configuration, PreparedTx};

/// Everything an action builder reads from the session.
#[derive(Debug, Clone, Copy)]
pub struct IncubationContext<'a> {
    pub founder: Address,
    pub configuration: &'a Configuration,
    pub config: &'a IncubatorConfig,
}

/// Transactions for one pipeline action, in submission order.
pub fn build_action(
    kind: ActionType,
    ctx: &IncubationContext<'_>,
) -> Result<Vec<PreparedTx>, IncubatorError> {
    let txs = match kind {
        ActionType::MintIdentity => vec![mint_identity(ctx)?],
        ActionType::SetupTreasury => vec![setup_treasury(ctx)?],
        ActionType::OpenChannel => open_channel(ctx)?,
        ActionType::ApproveBudget => vec![approve_budget(ctx)?],
        ActionType::DeployPool => vec![deploy_pool(ctx)?],
        ActionType::LockLiquidity => vec![lock_liquidity(ctx)?],
        ActionType::ProcessPayment | ActionType::VerifyVesting => {
            return Err(IncubatorError::intent(
                kind.as_str(),
                "not part of the incubation pipeline",
            ));
        }
    };
    tracing::debug!(action = %kind, transactions = txs.len(), "built incubation action");
    Ok(txs)
}

fn mint_identity(ctx: &IncubationContext<'_>) -> Result<PreparedTx, IncubatorError> {
    let slug = ctx
        .configuration
        .identity_slug
        .as_deref()
        .ok_or_else(|| missing(ActionType::MintIdentity, "identity name"))?;
    let config = ctx.config;
    register_identity(
        slug,
        &config.parent_domain,
        ctx.founder,
        config.name_registry()?,
        config.public_resolver()?,
        config.identity_chain,
    )
}

fn treasury_amount(ctx: &IncubationContext<'_>, kind: ActionType) -> Result<String, IncubatorError> {
    ctx.configuration
        .treasury_amount
        .map(|a| a.normalize().to_string())
        .ok_or_else(|| missing(kind, "treasury amount"))
}

fn setup_treasury(ctx: &IncubationContext<'_>) -> Result<PreparedTx, IncubatorError> {
    let amount = treasury_amount(ctx, ActionType::SetupTreasury)?;
    let mut tx = transfer_usdc(ctx.config.hub_dao()?, &amount, ctx.config.chain)?;
    tx.description = format!("Fund treasury with {amount} USDC");
    Ok(tx)
}

/// `[approve, deposit]`: the custody contract pulls the deposit.
fn open_channel(ctx: &IncubationContext<'_>) -> Result<Vec<PreparedTx>, IncubatorError> {
    let config = ctx.config;
    let custody = config.channel_custody()?;
    let deposit = &config.channel_deposit;
    let units = nonzero(to_base_units(deposit, USDC_DECIMALS)?, deposit)?;

    let approve = approve_usdc(custody, deposit, config.chain)?;
    let call = IChannelCustody::depositCall {
        account: ctx.founder,
        token: config.chain.usdc(),
        amount: units,
    };
    let open = prepared(
        custody,
        call.abi_encode(),
        config.chain,
        format!(
            "Deposit {} USDC into payment channel",
            from_base_units(units, USDC_DECIMALS)
        ),
    );
    Ok(vec![approve, open])
}

fn approve_budget(ctx: &IncubationContext<'_>) -> Result<PreparedTx, IncubatorError> {
    let amount = ctx
        .configuration
        .treasury_amount
        .ok_or_else(|| missing(ActionType::ApproveBudget, "treasury amount"))?;
    let units = nonzero(decimal_to_base_units(amount, USDC_DECIMALS)?, &amount.to_string())?;
    let call = IHubDAO::proposeBudgetCall { amount: units };
    Ok(prepared(
        ctx.config.hub_dao()?,
        call.abi_encode(),
        ctx.config.chain,
        format!(
            "Propose quarterly budget of {} USDC",
            from_base_units(units, USDC_DECIMALS)
        ),
    ))
}

/// Project token / USDC pool, hooked by the anti-rug hook when one is deployed.
pub fn project_pool_key(config: &IncubatorConfig) -> Result<PoolKey, IncubatorError> {
    canonical_pool_key(
        config.project_token()?,
        config.chain.usdc(),
        config.default_fee_tier,
        config.deployment.anti_rug_hook,
    )
}

/// Raw pool price (`currency_high` base units per `currency_low` base unit)
/// for a quote of `usdc_per_token` USDC per whole project token.
pub fn raw_pool_price(key: &PoolKey, project_token: Address, usdc_per_token: f64) -> f64 {
    let decimals_gap = 10f64.powi(i32::from(TOKEN_DECIMALS - USDC_DECIMALS));
    let usdc_units_per_token_unit = usdc_per_token / decimals_gap;
    if key.currency_low == project_token {
        usdc_units_per_token_unit
    } else {
        1.0 / usdc_units_per_token_unit
    }
}

fn deploy_pool(ctx: &IncubationContext<'_>) -> Result<PreparedTx, IncubatorError> {
    let config = ctx.config;
    let key = project_pool_key(config)?;
    let price = raw_pool_price(&key, config.project_token()?, config.initial_price);
    initialize_pool(&key, price, config.pool_manager()?, config.chain)
}

fn lock_liquidity(ctx: &IncubationContext<'_>) -> Result<PreparedTx, IncubatorError> {
    let config = ctx.config;
    let months = ctx
        .configuration
        .vesting_months
        .ok_or_else(|| missing(ActionType::LockLiquidity, "vesting period"))?;
    let share = ctx
        .configuration
        .liquidity_share_pct
        .unwrap_or(config.liquidity_share_pct);
    let supply = to_base_units(&config.token_supply, TOKEN_DECIMALS)?;
    let locked = supply
        .checked_mul(U256::from(share))
        .map(|v| v / U256::from(100u64))
        .ok_or_else(|| IncubatorError::InvalidAmount("token supply overflows".into()))?;

    let key = project_pool_key(config)?;
    initialize_vesting(
        &key,
        ctx.founder,
        months,
        locked,
        config.anti_rug_hook()?,
        config.chain,
    )
}

fn missing(kind: ActionType, field: &str) -> IncubatorError {
    IncubatorError::intent(kind.as_str(), format!("{field} is not configured"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::identity::{labelhash, namehash};
    use crate::builders::pool::MONTH_SECONDS;
    use crate::config::Deployment;
    use crate::contracts::{IAntiRugHook, IERC20, INameRegistry, IPoolManager};
    use crate::price::sqrt_price_to_price;
    use alloy::primitives::address;
    use rust_decimal::Decimal;

    const FOUNDER: Address = address!("00000000000000000000000000000000000000f0");
    const HUB: Address = address!("00000000000000000000000000000000000000a1");
    const CUSTODY: Address = address!("00000000000000000000000000000000000000a2");
    const TOKEN: Address = address!("ffffffffffffffffffffffffffffffffffffff01");
    const HOOK: Address = address!("00000000000000000000000000000000000000a4");

    fn config() -> IncubatorConfig {
        IncubatorConfig {
            deployment: Deployment {
                hub_dao: Some(HUB),
                channel_custody: Some(CUSTODY),
                project_token: Some(TOKEN),
                anti_rug_hook: Some(HOOK),
                ..Deployment::default()
            },
            ..IncubatorConfig::default()
        }
    }

    fn configuration() -> Configuration {
        Configuration {
            identity_slug: Some("defi-hub".into()),
            treasury_amount: Some(Decimal::new(10_000, 0)),
            vesting_months: Some(12),
            liquidity_share_pct: None,
        }
    }

    #[test]
    fn test_mint_identity_targets_registry() {
        let (config, configuration) = (config(), configuration());
        let ctx = IncubationContext { founder: FOUNDER, configuration: &configuration, config: &config };
        let txs = build_action(ActionType::MintIdentity, &ctx).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].chain_id, config.identity_chain.id());
        let call = INameRegistry::setSubnodeRecordCall::abi_decode(&txs[0].data).unwrap();
        assert_eq!(call.node, namehash("consul.eth"));
        assert_eq!(call.label, labelhash("defi-hub"));
        assert_eq!(call.owner, FOUNDER);
    }

    #[test]
    fn test_setup_treasury_and_budget() {
        let (config, configuration) = (config(), configuration());
        let ctx = IncubationContext { founder: FOUNDER, configuration: &configuration, config: &config };

        let fund = build_action(ActionType::SetupTreasury, &ctx).unwrap();
        let call = IERC20::transferCall::abi_decode(&fund[0].data).unwrap();
        assert_eq!(call.to, HUB);
        assert_eq!(call.amount, U256::from(10_000_000_000u64));
        assert_eq!(fund[0].description, "Fund treasury with 10000 USDC");

        let budget = build_action(ActionType::ApproveBudget, &ctx).unwrap();
        assert_eq!(budget[0].to, HUB);
        let call = IHubDAO::proposeBudgetCall::abi_decode(&budget[0].data).unwrap();
        assert_eq!(call.amount, U256::from(10_000_000_000u64));
    }

    #[test]
    fn test_open_channel_is_approve_then_deposit() {
        let (config, configuration) = (config(), configuration());
        let ctx = IncubationContext { founder: FOUNDER, configuration: &configuration, config: &config };
        let txs = build_action(ActionType::OpenChannel, &ctx).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].selector(), Some(IERC20::approveCall::SELECTOR));
        assert_eq!(txs[1].to, CUSTODY);
        let call = IChannelCustody::depositCall::abi_decode(&txs[1].data).unwrap();
        assert_eq!(call.account, FOUNDER);
        assert_eq!(call.amount, U256::from(100_000_000u64));
    }

    #[test]
    fn test_deploy_pool_price_accounts_for_decimals() {
        let (config, configuration) = (config(), configuration());
        let ctx = IncubationContext { founder: FOUNDER, configuration: &configuration, config: &config };
        let txs = build_action(ActionType::DeployPool, &ctx).unwrap();
        let call = IPoolManager::initializeCall::abi_decode(&txs[0].data).unwrap();
        assert_eq!(call.key.hooks, HOOK);
        // TOKEN sorts above USDC, so the pool prices tokens per USDC unit
        assert_eq!(call.key.currency1, TOKEN);
        let price = sqrt_price_to_price(U256::from(call.sqrtPriceX96));
        let expected = 1e12 / 0.01;
        assert!(((price - expected) / expected).abs() < 1e-9);
    }

    #[test]
    fn test_lock_liquidity_share_of_supply() {
        let (config, configuration) = (config(), configuration());
        let ctx = IncubationContext { founder: FOUNDER, configuration: &configuration, config: &config };
        let txs = build_action(ActionType::LockLiquidity, &ctx).unwrap();
        assert_eq!(txs[0].to, HOOK);
        let call = IAntiRugHook::initializeVestingCall::abi_decode(&txs[0].data).unwrap();
        // 20% of 100M tokens
        let expected = U256::from(20_000_000u64) * U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(call.totalLocked, expected);
        assert_eq!(call.vestingDuration, U256::from(12 * MONTH_SECONDS));
    }

    #[test]
    fn test_missing_inputs_are_build_errors() {
        let config = IncubatorConfig::default();
        let configuration = Configuration::default();
        let ctx = IncubationContext { founder: FOUNDER, configuration: &configuration, config: &config };
        assert!(matches!(
            build_action(ActionType::MintIdentity, &ctx),
            Err(IncubatorError::InvalidIntent { .. })
        ));
        assert!(matches!(
            build_action(ActionType::DeployPool, &ctx),
            Err(IncubatorError::MissingDeployment { .. })
        ));
        assert!(build_action(ActionType::VerifyVesting, &ctx).is_err());
    }
}
