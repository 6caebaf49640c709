//! Session store and action lifecycle.
//!
//! The engine never signs. It hands prepared transactions out through
//! [`Response`]s and learns their fate from the host, either through the
//! callback methods or by [`IncubationEngine::drive`] with a
//! [`TransactionSubmitter`].

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{info, warn};
use uuid::Uuid;

use crate::builders::identity::full_name;
use crate::collaborators::{IdentityResolver, TransactionSubmitter};
use crate::config::IncubatorConfig;
use crate::conversation::{self, Response, Snapshot, action_result_text, parse_identity};
use crate::error::IncubatorError;
use crate::ledger::Action;
use crate::pipeline::INCUBATION_PIPELINE;
use crate::session::Session;
use crate::types::{ActionStatus, ActionType, ConversationStep};

/// A pending identity availability lookup. Owns everything it needs, so it
/// can run after the engine has been released.
pub struct IdentityCheck {
    resolver: Arc<dyn IdentityResolver>,
    pub name: String,
}

impl IdentityCheck {
    pub async fn run(self) -> IdentityVerdict {
        let available = self.resolver.is_available(&self.name).await;
        if let Err(e) = &available {
            warn!(name = %self.name, error = %e, "identity availability check failed");
        }
        IdentityVerdict {
            name: self.name,
            available,
        }
    }
}

/// Outcome of an [`IdentityCheck`].
#[derive(Debug, Clone)]
pub struct IdentityVerdict {
    pub name: String,
    pub available: Result<bool, IncubatorError>,
}

pub struct IncubationEngine {
    config: IncubatorConfig,
    sessions: HashMap<Uuid, Session>,
    resolver: Option<Arc<dyn IdentityResolver>>,
}

impl IncubationEngine {
    pub fn new(config: IncubatorConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            resolver: None,
        }
    }

    /// Check identity availability before accepting a name.
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(&self) -> &IncubatorConfig {
        &self.config
    }

    /// Start a session and return its id with the opening prompt.
    pub fn create_session(&mut self, project_name: &str, founder: Address) -> (Uuid, Response) {
        let session = Session::new(project_name.trim(), founder);
        let id = session.id;
        let greeting = conversation::greeting(&session, &self.config);
        info!(session_id = %id, project = %session.project_name, founder = %founder, "session created");
        self.sessions.insert(id, session);
        (id, greeting)
    }

    pub fn session(&self, id: Uuid) -> Result<&Session, IncubatorError> {
        self.sessions
            .get(&id)
            .ok_or_else(|| IncubatorError::SessionNotFound(id.to_string()))
    }

    fn session_mut(&mut self, id: Uuid) -> Result<&mut Session, IncubatorError> {
        self.sessions
            .get_mut(&id)
            .ok_or_else(|| IncubatorError::SessionNotFound(id.to_string()))
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Apply one founder message. Validation problems come back as a
    /// re-prompt, not an `Err`.
    ///
    /// Hosts that share the engine between tasks should call
    /// [`Self::identity_check`], run it without holding their lock, and
    /// pass the verdict to [`Self::apply_message`].
    pub async fn handle_message(&mut self, id: Uuid, text: &str) -> Result<Response, IncubatorError> {
        let verdict = match self.identity_check(id, text)? {
            Some(check) => Some(check.run().await),
            None => None,
        };
        self.apply_message(id, text, verdict)
    }

    /// The availability lookup `text` needs before it can be applied, if
    /// the session is choosing its identity and a resolver is configured.
    pub fn identity_check(&self, id: Uuid, text: &str) -> Result<Option<IdentityCheck>, IncubatorError> {
        let session = self.session(id)?;
        if session.step() != ConversationStep::AskIdentityName {
            return Ok(None);
        }
        let (Some(resolver), Ok(slug)) = (
            self.resolver.clone(),
            parse_identity(text, &self.config.parent_domain),
        ) else {
            return Ok(None);
        };
        Ok(Some(IdentityCheck {
            resolver,
            name: full_name(&slug, &self.config.parent_domain),
        }))
    }

    /// Apply a message whose identity lookup, if any, has already run.
    /// A name is accepted only with a verdict for that exact name.
    pub fn apply_message(
        &mut self,
        id: Uuid,
        text: &str,
        verdict: Option<IdentityVerdict>,
    ) -> Result<Response, IncubatorError> {
        if let Some(check) = self.identity_check(id, text)? {
            let rejection = match verdict {
                Some(v) if v.name == check.name => match v.available {
                    Ok(true) => None,
                    Ok(false) => Some(format!("{} is already taken", v.name)),
                    Err(e) => Some(format!("Could not check availability of {}: {e}", v.name)),
                },
                _ => Some(format!("Could not check availability of {}", check.name)),
            };
            if let Some(reason) = rejection {
                return Ok(conversation::reject(self.session(id)?, &self.config, &reason));
            }
        }

        let config = &self.config;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| IncubatorError::SessionNotFound(id.to_string()))?;
        Ok(conversation::handle_input(session, text, config))
    }

    /// Pipeline action to offer next, or `None` once every step completed.
    pub fn next_action(&self, id: Uuid) -> Result<Option<ActionType>, IncubatorError> {
        Ok(self.session(id)?.next_action())
    }

    /// The founder's wallet broadcast the first transaction of an action.
    pub fn mark_submitted(
        &mut self,
        id: Uuid,
        action_id: Uuid,
        tx_hash: String,
    ) -> Result<Action, IncubatorError> {
        let action = self.session_mut(id)?.start_action(action_id, Some(tx_hash))?;
        info!(session_id = %id, action = %action.kind, tx_hash = ?action.tx_hash, "action submitted");
        Ok(action)
    }

    /// Every transaction of the action is mined. A still-pending action is
    /// moved through `executing` first.
    pub fn confirm_action(
        &mut self,
        id: Uuid,
        action_id: Uuid,
        tx_hash: Option<String>,
    ) -> Result<Response, IncubatorError> {
        let config = &self.config;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| IncubatorError::SessionNotFound(id.to_string()))?;
        let before = Snapshot::capture(session);

        let current = session
            .actions()
            .get(action_id)
            .ok_or_else(|| IncubatorError::ActionNotFound(action_id.to_string()))?;
        let kind = current.kind;
        if current.status == ActionStatus::Pending {
            session.start_action(action_id, tx_hash.clone())?;
        }
        let result = action_result_text(kind, session, config);
        let action = session.complete_action(action_id, tx_hash, result)?;

        if kind == ActionType::MintIdentity {
            session.identity_name = session
                .configuration
                .identity_slug
                .as_deref()
                .map(|slug| full_name(slug, &config.parent_domain));
        }

        info!(
            session_id = %id,
            action = %kind,
            completed = session.completed_count(),
            stage = %session.stage(),
            "action completed"
        );

        let message = match session.next_action() {
            Some(next) => format!(
                "{}. Progress: {}/{}. Next: {}.",
                action.result.as_deref().unwrap_or(action.description.as_str()),
                session.completed_count(),
                INCUBATION_PIPELINE.len(),
                next.description()
            ),
            None => format!(
                "{}. All {} incubation steps are complete. Reply \"continue\" to launch.",
                action.result.as_deref().unwrap_or(action.description.as_str()),
                INCUBATION_PIPELINE.len()
            ),
        };
        Ok(Response {
            message,
            action: Some(action),
            suggestions: vec!["Continue".into(), "Status".into()],
            transactions: Vec::new(),
            patch: before.patch(session),
        })
    }

    /// The wallet rejected the request or a transaction reverted. The
    /// pipeline step stays open and the next `continue` retries it.
    pub fn fail_action(
        &mut self,
        id: Uuid,
        action_id: Uuid,
        error: String,
    ) -> Result<Response, IncubatorError> {
        let session = self.session_mut(id)?;
        let before = Snapshot::capture(session);
        let action = session.fail_action(action_id, error)?;
        warn!(session_id = %id, action = %action.kind, error = ?action.error, "action failed");
        Ok(Response {
            message: format!(
                "\"{}\" failed: {}. Reply \"continue\" to retry.",
                action.description,
                action.error.as_deref().unwrap_or("unknown error")
            ),
            action: Some(action),
            suggestions: vec!["Continue".into(), "Status".into()],
            transactions: Vec::new(),
            patch: before.patch(session),
        })
    }

    /// Abandon any in-flight action. Completed work and the confirmed
    /// configuration are kept.
    pub fn reset(&mut self, id: Uuid) -> Result<Response, IncubatorError> {
        let config = &self.config;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| IncubatorError::SessionNotFound(id.to_string()))?;
        let before = Snapshot::capture(session);
        let cancelled = session.reset();
        info!(session_id = %id, cancelled, "session reset");
        let mut response = conversation::prompt(session, config);
        if cancelled > 0 {
            response.message = format!(
                "Cancelled {cancelled} pending action(s). {}",
                response.message
            );
        }
        response.patch = before.patch(session);
        Ok(response)
    }

    /// Submit and confirm every transaction of the in-flight action in
    /// order. The first failure fails the action and stops the sequence;
    /// the returned action reflects the final status either way.
    pub async fn drive(
        &mut self,
        id: Uuid,
        submitter: &dyn TransactionSubmitter,
    ) -> Result<Action, IncubatorError> {
        let active = self
            .session(id)?
            .in_flight()
            .cloned()
            .ok_or_else(|| IncubatorError::ActionNotFound("no action in flight".into()))?;

        let mut last_hash = active.tx_hash.clone();
        for (i, tx) in active.transactions.iter().enumerate() {
            let outcome = match submitter.submit(tx).await {
                Ok(hash) => {
                    if i == 0 && active.status == ActionStatus::Pending {
                        self.mark_submitted(id, active.id, hash.clone())?;
                    }
                    submitter.await_confirmation(&hash).await.map(|_| hash)
                }
                Err(e) => Err(e),
            };
            match outcome {
                Ok(hash) => last_hash = Some(hash),
                Err(e) => {
                    warn!(session_id = %id, action = %active.kind, tx = i, error = %e, "transaction failed");
                    let response = self.fail_action(id, active.id, e.to_string())?;
                    return response
                        .action
                        .ok_or_else(|| IncubatorError::ActionNotFound(active.id.to_string()));
                }
            }
        }

        let response = self.confirm_action(id, active.id, last_hash)?;
        response
            .action
            .ok_or_else(|| IncubatorError::ActionNotFound(active.id.to_string()))
    }
}
