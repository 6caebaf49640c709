//! Runtime configuration: target chains and contract deployments.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::error::IncubatorError;

/// Contract addresses for the incubator's own deployments. Unset entries fall
/// back to the canonical per-chain address where one exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Deployment {
    /// Treasury governance contract (holds USDC, approves budgets).
    pub hub_dao: Option<Address>,
    pub buyback: Option<Address>,
    pub project_token: Option<Address>,
    pub anti_rug_hook: Option<Address>,
    pub channel_custody: Option<Address>,
    pub name_registry: Option<Address>,
    pub public_resolver: Option<Address>,
    pub pool_manager: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IncubatorConfig {
    /// Chain that treasury, pool and buyback transactions target.
    pub chain: Chain,
    /// Chain hosting the name registry.
    pub identity_chain: Chain,
    pub parent_domain: String,
    pub deployment: Deployment,
    pub default_fee_tier: u32,
    pub default_slippage_bps: u32,
    /// Share of token supply committed to liquidity, in percent.
    pub liquidity_share_pct: u8,
    /// USDC deposited when opening the payment channel.
    pub channel_deposit: String,
    /// Project token supply in whole tokens.
    pub token_supply: String,
    /// Opening pool price, quote currency per project token.
    pub initial_price: f64,
}

impl Default for IncubatorConfig {
    fn default() -> Self {
        Self {
            chain: Chain::BaseSepolia,
            identity_chain: Chain::Sepolia,
            parent_domain: "consul.eth".to_string(),
            deployment: Deployment::default(),
            default_fee_tier: 3000,
            default_slippage_bps: 50,
            liquidity_share_pct: 20,
            channel_deposit: "100".to_string(),
            token_supply: "100000000".to_string(),
            initial_price: 0.01,
        }
    }
}

impl IncubatorConfig {
    /// Load from `INCUBATOR_*` environment variables, defaulting anything unset.
    pub fn from_env() -> Result<Self, IncubatorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IncubatorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("INCUBATOR_CHAIN") {
            config.chain = v.parse().map_err(|e| config_err("INCUBATOR_CHAIN", e))?;
        }
        if let Some(v) = get("INCUBATOR_IDENTITY_CHAIN") {
            config.identity_chain =
                v.parse().map_err(|e| config_err("INCUBATOR_IDENTITY_CHAIN", e))?;
        }
        if let Some(v) = get("INCUBATOR_PARENT_DOMAIN") {
            config.parent_domain = v.trim().to_lowercase();
        }
        if let Some(v) = get("INCUBATOR_FEE_TIER") {
            config.default_fee_tier = v
                .trim()
                .parse()
                .map_err(|e| config_err("INCUBATOR_FEE_TIER", e))?;
        }
        if let Some(v) = get("INCUBATOR_SLIPPAGE_BPS") {
            config.default_slippage_bps = v
                .trim()
                .parse()
                .map_err(|e| config_err("INCUBATOR_SLIPPAGE_BPS", e))?;
        }
        if let Some(v) = get("INCUBATOR_LIQUIDITY_SHARE_PCT") {
            config.liquidity_share_pct = v
                .trim()
                .parse()
                .map_err(|e| config_err("INCUBATOR_LIQUIDITY_SHARE_PCT", e))?;
        }
        if let Some(v) = get("INCUBATOR_CHANNEL_DEPOSIT") {
            config.channel_deposit = v;
        }
        if let Some(v) = get("INCUBATOR_TOKEN_SUPPLY") {
            config.token_supply = v;
        }
        if let Some(v) = get("INCUBATOR_INITIAL_PRICE") {
            config.initial_price = v
                .trim()
                .parse()
                .map_err(|e| config_err("INCUBATOR_INITIAL_PRICE", e))?;
        }

        let address = |key: &str| -> Result<Option<Address>, IncubatorError> {
            get(key)
                .map(|v| v.trim().parse::<Address>().map_err(|e| config_err(key, e)))
                .transpose()
        };
        config.deployment = Deployment {
            hub_dao: address("INCUBATOR_HUB_DAO")?,
            buyback: address("INCUBATOR_BUYBACK")?,
            project_token: address("INCUBATOR_PROJECT_TOKEN")?,
            anti_rug_hook: address("INCUBATOR_ANTI_RUG_HOOK")?,
            channel_custody: address("INCUBATOR_CHANNEL_CUSTODY")?,
            name_registry: address("INCUBATOR_NAME_REGISTRY")?,
            public_resolver: address("INCUBATOR_PUBLIC_RESOLVER")?,
            pool_manager: address("INCUBATOR_POOL_MANAGER")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), IncubatorError> {
        crate::pool_key::FeeTier::try_from(self.default_fee_tier)
            .map_err(|e| IncubatorError::ConfigError(e.to_string()))?;
        if self.default_slippage_bps > crate::amounts::BPS_DENOMINATOR {
            return Err(IncubatorError::ConfigError(format!(
                "slippage {} bps exceeds 100%",
                self.default_slippage_bps
            )));
        }
        if self.liquidity_share_pct == 0 || self.liquidity_share_pct > 100 {
            return Err(IncubatorError::ConfigError(format!(
                "liquidity share {}% must be within 1-100",
                self.liquidity_share_pct
            )));
        }
        if self.parent_domain.is_empty() {
            return Err(IncubatorError::ConfigError("parent domain is empty".into()));
        }
        Ok(())
    }

    pub fn hub_dao(&self) -> Result<Address, IncubatorError> {
        self.require(self.deployment.hub_dao, "treasury", self.chain)
    }

    pub fn buyback(&self) -> Result<Address, IncubatorError> {
        self.buyback_on(self.chain)
    }

    /// The buyback deployment is only known on the configured chain.
    pub fn buyback_on(&self, chain: Chain) -> Result<Address, IncubatorError> {
        let addr = self.deployment.buyback.filter(|_| chain == self.chain);
        self.require(addr, "buyback", chain)
    }

    pub fn project_token(&self) -> Result<Address, IncubatorError> {
        self.require(self.deployment.project_token, "project token", self.chain)
    }

    pub fn anti_rug_hook(&self) -> Result<Address, IncubatorError> {
        self.require(self.deployment.anti_rug_hook, "anti-rug hook", self.chain)
    }

    pub fn channel_custody(&self) -> Result<Address, IncubatorError> {
        self.require(self.deployment.channel_custody, "channel custody", self.chain)
    }

    pub fn pool_manager(&self) -> Result<Address, IncubatorError> {
        self.pool_manager_on(self.chain)
    }

    /// Pool manager on `chain`. The deployment override applies to the
    /// configured chain only; other chains use the canonical address.
    pub fn pool_manager_on(&self, chain: Chain) -> Result<Address, IncubatorError> {
        let addr = self
            .deployment
            .pool_manager
            .filter(|_| chain == self.chain)
            .or_else(|| chain.pool_manager());
        self.require(addr, "pool manager", chain)
    }

    pub fn name_registry(&self) -> Result<Address, IncubatorError> {
        let addr = self
            .deployment
            .name_registry
            .or_else(|| self.identity_chain.name_registry());
        self.require(addr, "name registry", self.identity_chain)
    }

    pub fn public_resolver(&self) -> Result<Address, IncubatorError> {
        let addr = self
            .deployment
            .public_resolver
            .or_else(|| self.identity_chain.public_resolver());
        self.require(addr, "public resolver", self.identity_chain)
    }

    fn require(
        &self,
        addr: Option<Address>,
        contract: &str,
        chain: Chain,
    ) -> Result<Address, IncubatorError> {
        addr.ok_or_else(|| IncubatorError::MissingDeployment {
            contract: contract.to_string(),
            chain: chain.to_string(),
        })
    }
}

fn config_err(key: &str, e: impl std::fmt::Display) -> IncubatorError {
    IncubatorError::ConfigError(format!("{key}: {e}"))
}
