//! One founder's incubation attempt.
//!
//! The stage is derived, never assigned: every ledger mutation goes through
//! a `Session` method that recomputes it from the completed-action count.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::builders::identity::ProjectManifest;
use crate::error::IncubatorError;
use crate::ledger::{Action, ActionLedger};
use crate::pipeline;
use crate::stage::stage_for;
use crate::types::{ActionType, Configuration, ConversationStep, PreparedTx, Stage};

/// Error recorded on actions abandoned by [`Session::reset`].
pub const CANCELLED_BY_RESET: &str = "Cancelled by reset";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "StoredSession")]
pub struct Session {
    pub id: Uuid,
    pub project_name: String,
    pub founder: Address,
    /// Fully-qualified identity once registered.
    pub identity_name: Option<String>,
    stage: Stage,
    #[serde(rename = "actions")]
    ledger: ActionLedger,
    pub configuration: Configuration,
    step: ConversationStep,
    pub created_at: DateTime<Utc>,
}

/// Wire form of a persisted [`Session`]. A stored `stage` is ignored and
/// re-derived from the ledger.
#[derive(Deserialize)]
struct StoredSession {
    id: Uuid,
    project_name: String,
    founder: Address,
    identity_name: Option<String>,
    #[serde(rename = "actions")]
    ledger: ActionLedger,
    configuration: Configuration,
    step: ConversationStep,
    created_at: DateTime<Utc>,
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        let mut session = Self {
            id: stored.id,
            project_name: stored.project_name,
            founder: stored.founder,
            identity_name: stored.identity_name,
            stage: Stage::Applied,
            ledger: stored.ledger,
            configuration: stored.configuration,
            step: stored.step,
            created_at: stored.created_at,
        };
        session.recompute_stage();
        session
    }
}

impl Session {
    pub fn new(project_name: impl Into<String>, founder: Address) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_name: project_name.into(),
            founder,
            identity_name: None,
            stage: Stage::Applied,
            ledger: ActionLedger::new(),
            configuration: Configuration::default(),
            step: ConversationStep::AskIdentityName,
            created_at: Utc::now(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn step(&self) -> ConversationStep {
        self.step
    }

    pub fn actions(&self) -> &ActionLedger {
        &self.ledger
    }

    /// Whether the founder has confirmed the configuration.
    pub fn incubation_started(&self) -> bool {
        matches!(
            self.step,
            ConversationStep::Incubating | ConversationStep::Completed
        )
    }

    pub(crate) fn set_step(&mut self, step: ConversationStep) {
        self.step = step;
        self.recompute_stage();
    }

    /// Once incubation has begun the stage never drops below screening;
    /// beyond that it is exactly [`stage_for`] of the completed count.
    fn recompute_stage(&mut self) {
        let derived = stage_for(self.ledger.completed_count());
        self.stage = if self.incubation_started() {
            derived.max(Stage::Screening)
        } else {
            derived
        };
    }

    pub fn next_action(&self) -> Option<ActionType> {
        pipeline::next_action(&self.ledger.completed_types())
    }

    pub fn completed_count(&self) -> usize {
        self.ledger.completed_count()
    }

    pub fn in_flight(&self) -> Option<&Action> {
        self.ledger.in_flight()
    }

    pub fn begin_action(
        &mut self,
        kind: ActionType,
        transactions: Vec<PreparedTx>,
    ) -> Result<Action, IncubatorError> {
        let action = self.ledger.append(kind, transactions)?.clone();
        self.recompute_stage();
        Ok(action)
    }

    pub fn start_action(&mut self, id: Uuid, tx_hash: Option<String>) -> Result<Action, IncubatorError> {
        let action = self.ledger.start(id, tx_hash)?.clone();
        self.recompute_stage();
        Ok(action)
    }

    pub fn complete_action(
        &mut self,
        id: Uuid,
        tx_hash: Option<String>,
        result: String,
    ) -> Result<Action, IncubatorError> {
        let action = self.ledger.complete(id, tx_hash, result)?.clone();
        self.recompute_stage();
        Ok(action)
    }

    pub fn fail_action(&mut self, id: Uuid, error: String) -> Result<Action, IncubatorError> {
        let action = self.ledger.fail(id, error)?.clone();
        self.recompute_stage();
        Ok(action)
    }

    /// Clear in-flight markers. Completed actions and the configuration are kept.
    pub fn reset(&mut self) -> usize {
        let cancelled = self.ledger.cancel_in_flight(CANCELLED_BY_RESET);
        self.recompute_stage();
        cancelled
    }

    pub fn identity_registered(&self) -> bool {
        self.ledger.has_completed(ActionType::MintIdentity)
    }

    pub fn pool_deployed(&self) -> bool {
        self.ledger.has_completed(ActionType::DeployPool)
    }

    pub fn lock_active(&self) -> bool {
        self.ledger.has_completed(ActionType::LockLiquidity)
    }

    pub fn manifest(&self) -> ProjectManifest {
        ProjectManifest::new(&self.project_name, self.founder, self.stage, self.created_at)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session: self.clone(),
            identity_registered: self.identity_registered(),
            pool_deployed: self.pool_deployed(),
            lock_active: self.lock_active(),
            next_action: self.next_action(),
        }
    }
}

/// Serialized session with the derived display flags.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    pub identity_registered: bool,
    pub pool_deployed: bool,
    pub lock_active: bool,
    pub next_action: Option<ActionType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionStatus;

    fn session() -> Session {
        Session::new("DeFi Hub", Address::ZERO)
    }

    fn complete(session: &mut Session, kind: ActionType) {
        let id = session.begin_action(kind, vec![]).unwrap().id;
        session.start_action(id, None).unwrap();
        session.complete_action(id, None, "ok".into()).unwrap();
    }

    #[test]
    fn test_stage_tracks_completions() {
        let mut s = session();
        assert_eq!(s.stage(), Stage::Applied);
        s.set_step(ConversationStep::Incubating);
        assert_eq!(s.stage(), Stage::Screening);

        for (i, kind) in pipeline::INCUBATION_PIPELINE.into_iter().enumerate() {
            complete(&mut s, kind);
            assert_eq!(s.stage(), stage_for(i + 1).max(Stage::Screening));
        }
        assert_eq!(s.stage(), Stage::Launched);
        assert!(s.identity_registered() && s.pool_deployed() && s.lock_active());
        assert_eq!(s.next_action(), None);
    }

    #[test]
    fn test_failure_does_not_advance() {
        let mut s = session();
        s.set_step(ConversationStep::Incubating);
        complete(&mut s, ActionType::MintIdentity);
        let id = s.begin_action(ActionType::SetupTreasury, vec![]).unwrap().id;
        s.start_action(id, None).unwrap();
        s.fail_action(id, "reverted".into()).unwrap();
        assert_eq!(s.stage(), Stage::Screening);
        assert_eq!(s.next_action(), Some(ActionType::SetupTreasury));
    }

    #[test]
    fn test_reset_cancels_in_flight_only() {
        let mut s = session();
        s.set_step(ConversationStep::Incubating);
        complete(&mut s, ActionType::MintIdentity);
        s.begin_action(ActionType::SetupTreasury, vec![]).unwrap();
        assert_eq!(s.reset(), 1);
        assert!(s.in_flight().is_none());
        let last = s.actions().iter().last().unwrap();
        assert_eq!(last.status, ActionStatus::Failed);
        assert_eq!(last.error.as_deref(), Some(CANCELLED_BY_RESET));
        assert_eq!(s.completed_count(), 1);
    }

    #[test]
    fn test_loaded_stage_follows_ledger() {
        let mut s = session();
        s.set_step(ConversationStep::Incubating);
        complete(&mut s, ActionType::MintIdentity);
        complete(&mut s, ActionType::SetupTreasury);

        let mut stored = serde_json::to_value(&s).unwrap();
        assert_eq!(stored["stage"], "screening");
        stored["stage"] = "launched".into();

        let loaded: Session = serde_json::from_value(stored).unwrap();
        assert_eq!(loaded.stage(), Stage::Screening);
        assert_eq!(loaded, s);
    }

    #[test]
    fn test_view_serializes_flags() {
        let s = session();
        let json = serde_json::to_value(s.view()).unwrap();
        assert_eq!(json["stage"], "applied");
        assert_eq!(json["step"], "ask_identity_name");
        assert_eq!(json["identity_registered"], false);
        assert_eq!(json["next_action"], "mint_identity");
        assert!(json["actions"].as_array().unwrap().is_empty());
    }
}
