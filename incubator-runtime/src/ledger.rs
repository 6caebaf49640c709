//! Append-only record of attempted and completed actions for one session.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IncubatorError;
use crate::types::{ActionStatus, ActionType, PreparedTx};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActionType,
    pub status: ActionStatus,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Prepared transactions to sign, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<PreparedTx>,
}

impl Action {
    fn new(kind: ActionType, transactions: Vec<PreparedTx>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: ActionStatus::Pending,
            description: kind.description().to_string(),
            tx_hash: None,
            result: None,
            error: None,
            timestamp: Utc::now(),
            transactions,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Actions are only ever appended; an action is frozen once it reaches a
/// terminal status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ActionLedger {
    actions: Vec<Action>,
}

impl ActionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pending action. At most one action may be in flight.
    pub fn append(
        &mut self,
        kind: ActionType,
        transactions: Vec<PreparedTx>,
    ) -> Result<&Action, IncubatorError> {
        if let Some(active) = self.in_flight() {
            return Err(IncubatorError::ActionInFlight(active.kind.to_string()));
        }
        self.actions.push(Action::new(kind, transactions));
        let idx = self.actions.len() - 1;
        Ok(&self.actions[idx])
    }

    /// `pending -> executing`, recording the submitted hash if known.
    pub fn start(&mut self, id: Uuid, tx_hash: Option<String>) -> Result<&Action, IncubatorError> {
        let action = self.transition(id, ActionStatus::Executing)?;
        if tx_hash.is_some() {
            action.tx_hash = tx_hash;
        }
        Ok(action)
    }

    pub fn complete(
        &mut self,
        id: Uuid,
        tx_hash: Option<String>,
        result: String,
    ) -> Result<&Action, IncubatorError> {
        let action = self.transition(id, ActionStatus::Completed)?;
        if tx_hash.is_some() {
            action.tx_hash = tx_hash;
        }
        action.result = Some(result);
        Ok(action)
    }

    pub fn fail(&mut self, id: Uuid, error: String) -> Result<&Action, IncubatorError> {
        let action = self.transition(id, ActionStatus::Failed)?;
        action.error = Some(error);
        Ok(action)
    }

    /// Fail every in-flight action with `reason`; completed entries are
    /// untouched. Returns how many were cancelled.
    pub fn cancel_in_flight(&mut self, reason: &str) -> usize {
        let mut cancelled = 0;
        for action in self.actions.iter_mut().filter(|a| a.is_in_flight()) {
            action.status = ActionStatus::Failed;
            action.error = Some(reason.to_string());
            action.timestamp = Utc::now();
            cancelled += 1;
        }
        cancelled
    }

    fn transition(&mut self, id: Uuid, next: ActionStatus) -> Result<&mut Action, IncubatorError> {
        let action = self
            .actions
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| IncubatorError::ActionNotFound(id.to_string()))?;
        if !action.status.can_transition_to(next) {
            return Err(IncubatorError::InvalidTransition {
                from: action.status.to_string(),
                to: next.to_string(),
            });
        }
        action.status = next;
        action.timestamp = Utc::now();
        Ok(action)
    }

    pub fn get(&self, id: Uuid) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn in_flight(&self) -> Option<&Action> {
        self.actions.iter().find(|a| a.is_in_flight())
    }

    pub fn completed_types(&self) -> HashSet<ActionType> {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::Completed)
            .map(|a| a.kind)
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::Completed)
            .count()
    }

    pub fn has_completed(&self, kind: ActionType) -> bool {
        self.actions
            .iter()
            .any(|a| a.kind == kind && a.status == ActionStatus::Completed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
