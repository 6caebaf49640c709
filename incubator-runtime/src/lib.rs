pub mod amounts;
pub mod builders;
pub mod chain;
pub mod collaborators;
pub mod config;
pub mod contracts;
pub mod conversation;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod pool_key;
pub mod price;
pub mod registry;
pub mod session;
pub mod stage;
pub mod types;

pub use chain::Chain;
pub use config::{Deployment, IncubatorConfig};
pub use conversation::{Response, SessionPatch};
pub use engine::IncubationEngine;
pub use error::IncubatorError;
pub use ledger::{Action, ActionLedger};
pub use pool_key::{FeeTier, PoolKey};
pub use session::{Session, SessionView};
pub use types::*;
