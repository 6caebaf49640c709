use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IncubatorError {
    #[error("Invalid identity name: {0}")]
    InvalidIdentity(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Treasury amount {amount} out of range: must be between {min} and {max} USDC")]
    TreasuryOutOfRange {
        amount: String,
        min: String,
        max: String,
    },

    #[error("Invalid vesting period: {0} months (must be 6-48)")]
    InvalidVestingPeriod(u32),

    #[error("Unsupported fee tier: {0}")]
    UnsupportedFeeTier(u32),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Invalid slippage: {0} bps")]
    InvalidSlippage(u32),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid intent for {tool}: {message}")]
    InvalidIntent { tool: String, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("No {contract} deployment configured on {chain}")]
    MissingDeployment { contract: String, chain: String },

    #[error("Pool currencies must differ")]
    IdenticalCurrencies,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Invalid action transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Action already in flight: {0}")]
    ActionInFlight(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Confirmation failed: {0}")]
    Confirmation(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl IncubatorError {
    /// Recoverable input problems: the caller re-prompts without touching state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IncubatorError::InvalidIdentity(_)
                | IncubatorError::InvalidAmount(_)
                | IncubatorError::TreasuryOutOfRange { .. }
                | IncubatorError::InvalidVestingPeriod(_)
                | IncubatorError::UnsupportedFeeTier(_)
                | IncubatorError::UnsupportedChain(_)
                | IncubatorError::InvalidSlippage(_)
                | IncubatorError::InvalidPrice(_)
        )
    }

    /// Failures reported by a collaborator outside the core (signer, RPC).
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            IncubatorError::Submission(_)
                | IncubatorError::Confirmation(_)
                | IncubatorError::Rpc(_)
                | IncubatorError::Decode(_)
        )
    }

    pub(crate) fn intent(tool: &str, message: impl Into<String>) -> Self {
        IncubatorError::InvalidIntent {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for IncubatorError {
    fn from(e: serde_json::Error) -> Self {
        IncubatorError::SerializationError(e.to_string())
    }
}

impl From<alloy::sol_types::Error> for IncubatorError {
    fn from(e: alloy::sol_types::Error) -> Self {
        IncubatorError::Decode(e.to_string())
    }
}
