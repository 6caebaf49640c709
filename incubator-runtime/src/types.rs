use std::fmt;

use alloy::primitives::{Address, Bytes, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The closed set of incubation operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    MintIdentity,
    SetupTreasury,
    OpenChannel,
    ApproveBudget,
    ProcessPayment,
    DeployPool,
    LockLiquidity,
    VerifyVesting,
}

impl ActionType {
    pub const ALL: [ActionType; 8] = [
        ActionType::MintIdentity,
        ActionType::SetupTreasury,
        ActionType::OpenChannel,
        ActionType::ApproveBudget,
        ActionType::ProcessPayment,
        ActionType::DeployPool,
        ActionType::LockLiquidity,
        ActionType::VerifyVesting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::MintIdentity => "mint_identity",
            ActionType::SetupTreasury => "setup_treasury",
            ActionType::OpenChannel => "open_channel",
            ActionType::ApproveBudget => "approve_budget",
            ActionType::ProcessPayment => "process_payment",
            ActionType::DeployPool => "deploy_pool",
            ActionType::LockLiquidity => "lock_liquidity",
            ActionType::VerifyVesting => "verify_vesting",
        }
    }

    /// Progress text shown while the action runs.
    pub fn description(&self) -> &'static str {
        match self {
            ActionType::MintIdentity => "Minting identity subdomain",
            ActionType::SetupTreasury => "Setting up USDC treasury",
            ActionType::OpenChannel => "Opening payment channel",
            ActionType::ApproveBudget => "Approving quarterly budget",
            ActionType::ProcessPayment => "Processing contractor payment",
            ActionType::DeployPool => "Deploying liquidity pool",
            ActionType::LockLiquidity => "Locking liquidity with anti-rug hook",
            ActionType::VerifyVesting => "Verifying token vesting schedule",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action lifecycle. Transitions only move forward:
/// `pending -> executing -> {completed | failed}`.
///
/// `pending -> failed` is also allowed: a wallet that refuses to sign
/// fails the action before anything is broadcast, so it never executes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

impl ActionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ActionStatus) -> bool {
        matches!(
            (self, next),
            (ActionStatus::Pending, ActionStatus::Executing)
                | (ActionStatus::Pending, ActionStatus::Failed)
                | (ActionStatus::Executing, ActionStatus::Completed)
                | (ActionStatus::Executing, ActionStatus::Failed)
        )
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Executing => "executing",
            ActionStatus::Completed => "completed",
            ActionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Derived summary of incubation progress. Ordered so that later stages
/// compare greater.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Applied,
    Screening,
    Incubating,
    Launching,
    Launched,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Applied => "Applied",
            Stage::Screening => "Screening",
            Stage::Incubating => "Incubating",
            Stage::Launching => "Launching",
            Stage::Launched => "Launched",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Position of a session in the founder interview.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    AskIdentityName,
    AskTreasuryAmount,
    AskVestingPeriod,
    ConfirmConfig,
    Incubating,
    Completed,
}

/// Founder-chosen parameters, filled in one field at a time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Configuration {
    pub identity_slug: Option<String>,
    /// Treasury amount in whole USDC.
    pub treasury_amount: Option<Decimal>,
    pub vesting_months: Option<u32>,
    /// Percentage of supply committed to liquidity.
    pub liquidity_share_pct: Option<u8>,
}

impl Configuration {
    pub fn is_complete(&self) -> bool {
        self.identity_slug.is_some()
            && self.treasury_amount.is_some()
            && self.vesting_months.is_some()
    }
}

/// An unsigned transaction descriptor ready for an external signer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreparedTx {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub chain_id: u64,
    pub description: String,
}

impl PreparedTx {
    /// First four bytes of the call payload.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// A read-only call descriptor for the contract read interface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadCall {
    pub to: Address,
    pub data: Bytes,
}

/// Result of invoking a tool: one transaction, or an ordered sequence whose
/// entries must each be confirmed before the next is submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ToolOutput {
    Single(PreparedTx),
    Sequence(Vec<PreparedTx>),
}

impl ToolOutput {
    pub fn into_vec(self) -> Vec<PreparedTx> {
        match self {
            ToolOutput::Single(tx) => vec![tx],
            ToolOutput::Sequence(txs) => txs,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ToolOutput::Single(_) => 1,
            ToolOutput::Sequence(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
