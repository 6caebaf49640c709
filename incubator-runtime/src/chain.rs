//! Supported chains and their canonical token/bridge deployments.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

use crate::error::IncubatorError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", try_from = "ChainRef")]
pub enum Chain {
    Ethereum,
    Base,
    BaseSepolia,
    Arbitrum,
    Polygon,
    Sepolia,
}

impl Chain {
    pub const ALL: [Chain; 6] = [
        Chain::Ethereum,
        Chain::Base,
        Chain::BaseSepolia,
        Chain::Arbitrum,
        Chain::Polygon,
        Chain::Sepolia,
    ];

    pub fn id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Base => 8453,
            Chain::BaseSepolia => 84532,
            Chain::Arbitrum => 42161,
            Chain::Polygon => 137,
            Chain::Sepolia => 11155111,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Base => "base",
            Chain::BaseSepolia => "base_sepolia",
            Chain::Arbitrum => "arbitrum",
            Chain::Polygon => "polygon",
            Chain::Sepolia => "sepolia",
        }
    }

    pub fn from_id(chain_id: u64) -> Result<Self, IncubatorError> {
        Chain::ALL
            .into_iter()
            .find(|c| c.id() == chain_id)
            .ok_or_else(|| IncubatorError::UnsupportedChain(chain_id.to_string()))
    }

    /// Native USDC token contract.
    pub fn usdc(&self) -> Address {
        match self {
            Chain::Ethereum => address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            Chain::Base => address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            Chain::BaseSepolia => address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            Chain::Arbitrum => address!("af88d065e77c8cC2239327C5EDb3A432268e5831"),
            Chain::Polygon => address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
            Chain::Sepolia => address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
        }
    }

    /// Cross-domain bridge (CCTP) domain identifier, if the chain is bridgeable.
    pub fn bridge_domain(&self) -> Option<u32> {
        match self {
            Chain::Ethereum => Some(0),
            Chain::Arbitrum => Some(3),
            Chain::Base => Some(6),
            Chain::Polygon => Some(7),
            Chain::BaseSepolia | Chain::Sepolia => None,
        }
    }

    /// Bridge token messenger contract, if the chain is bridgeable.
    pub fn token_messenger(&self) -> Option<Address> {
        match self {
            Chain::Ethereum => Some(address!("bd3fa81b58ba92a82136038b25adec7066af3155")),
            Chain::Base => Some(address!("1682Ae6375C4E4A97e4B583BC394c861A46D8962")),
            Chain::Arbitrum => Some(address!("19330d10D9Cc8751218eaf51E8885D058642E08A")),
            Chain::Polygon => Some(address!("9daF8c91AEFAE50b9c0E69629D3F6Ca40cA3B3FE")),
            Chain::BaseSepolia | Chain::Sepolia => None,
        }
    }

    /// Canonical pool manager deployment, where one is known.
    pub fn pool_manager(&self) -> Option<Address> {
        match self {
            Chain::Base => Some(address!("498581fF718922c3f8e6A244956aF099B2652b2b")),
            Chain::BaseSepolia => Some(address!("05E73354cFDd6745C338b50BcFDfA3Aa6fA03408")),
            _ => None,
        }
    }

    /// Name registry deployment (same address on mainnet and Sepolia).
    pub fn name_registry(&self) -> Option<Address> {
        match self {
            Chain::Ethereum | Chain::Sepolia => {
                Some(address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e"))
            }
            _ => None,
        }
    }

    /// Public resolver used for newly registered names.
    pub fn public_resolver(&self) -> Option<Address> {
        match self {
            Chain::Ethereum => Some(address!("231b0Ee14048e9dCcD1d247744d114a4EB5E8E63")),
            Chain::Sepolia => Some(address!("8FADE66B79cC9f707aB26799354482EB93a5B7dD")),
            _ => None,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = IncubatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "ethereum" | "mainnet" => Ok(Chain::Ethereum),
            "base" => Ok(Chain::Base),
            "basesepolia" => Ok(Chain::BaseSepolia),
            "arbitrum" => Ok(Chain::Arbitrum),
            "polygon" => Ok(Chain::Polygon),
            "sepolia" => Ok(Chain::Sepolia),
            _ => match normalized.parse::<u64>() {
                Ok(id) => Chain::from_id(id),
                Err(_) => Err(IncubatorError::UnsupportedChain(s.to_string())),
            },
        }
    }
}

/// A chain as written in an intent or config file: a name in any of the
/// forms [`Chain::from_str`] accepts, or a numeric chain id.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChainRef {
    Id(u64),
    Name(String),
}

impl ChainRef {
    pub fn resolve(&self) -> Result<Chain, IncubatorError> {
        match self {
            ChainRef::Id(id) => Chain::from_id(*id),
            ChainRef::Name(name) => name.parse(),
        }
    }
}

impl TryFrom<ChainRef> for Chain {
    type Error = IncubatorError;

    fn try_from(value: ChainRef) -> Result<Self, Self::Error> {
        value.resolve()
    }
}

/// The chain an intent names, or `default` when it names none.
pub fn resolve_or(chain: Option<&ChainRef>, default: Chain) -> Result<Chain, IncubatorError> {
    chain.map_or(Ok(default), ChainRef::resolve)
}
