//! Founder interview and incubation driver.
//!
//! `ask_identity_name -> ask_treasury_amount -> ask_vesting_period ->
//! confirm_config -> incubating -> completed`. Every field is validated
//! before it is stored; invalid or unrecognised input re-prompts without
//! changing state. `change <field>` from `confirm_config` is the only way
//! back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::amounts::{format_usd, parse_human_amount};
use crate::builders::identity::{full_name, slugify, validate_slug};
use crate::builders::incubation::{IncubationContext, build_action};
use crate::builders::pool::{MAX_VESTING_MONTHS, MIN_VESTING_MONTHS};
use crate::config::IncubatorConfig;
use crate::error::IncubatorError;
use crate::ledger::Action;
use crate::pipeline::{self, INCUBATION_PIPELINE};
use crate::session::Session;
use crate::types::{ActionStatus, ActionType, Configuration, ConversationStep, PreparedTx, Stage};

/// Treasury bounds in whole USDC.
pub const TREASURY_MIN: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);
pub const TREASURY_MAX: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

/// Reply to one founder message or callback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Transactions the founder's wallet must sign, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<PreparedTx>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<SessionPatch>,
}

impl Response {
    fn text(message: impl Into<String>, suggestions: &[&str]) -> Self {
        Self {
            message: message.into(),
            action: None,
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            transactions: Vec::new(),
            patch: None,
        }
    }
}

/// Session fields a reply changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<ConversationStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_name: Option<String>,
}

/// Session state before a mutation, for computing its [`SessionPatch`].
pub(crate) struct Snapshot {
    step: ConversationStep,
    stage: Stage,
    configuration: Configuration,
    identity_name: Option<String>,
}

impl Snapshot {
    pub(crate) fn capture(session: &Session) -> Self {
        Self {
            step: session.step(),
            stage: session.stage(),
            configuration: session.configuration.clone(),
            identity_name: session.identity_name.clone(),
        }
    }

    pub(crate) fn patch(&self, session: &Session) -> Option<SessionPatch> {
        let patch = SessionPatch {
            step: (session.step() != self.step).then(|| session.step()),
            stage: (session.stage() != self.stage).then(|| session.stage()),
            configuration: (session.configuration != self.configuration)
                .then(|| session.configuration.clone()),
            identity_name: (session.identity_name != self.identity_name)
                .then(|| session.identity_name.clone())
                .flatten(),
        };
        (patch != SessionPatch::default()).then_some(patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Identity,
    Treasury,
    Vesting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Confirm,
    Change(Field),
    Continue,
    Status,
    Other,
}

fn classify(text: &str) -> Command {
    let lower = text.trim().to_lowercase();
    let first = lower.split_whitespace().next().unwrap_or("");
    match first {
        "confirm" | "yes" => return Command::Confirm,
        "continue" | "next" | "launch" | "start" | "begin" => return Command::Continue,
        "change" | "edit" => {
            return if ["name", "identity", "slug"].iter().any(|w| lower.contains(w)) {
                Command::Change(Field::Identity)
            } else if ["treasury", "amount", "budget"].iter().any(|w| lower.contains(w)) {
                Command::Change(Field::Treasury)
            } else if ["vesting", "period", "months", "lock"].iter().any(|w| lower.contains(w)) {
                Command::Change(Field::Vesting)
            } else {
                Command::Other
            };
        }
        _ => {}
    }
    if lower.contains("status") || lower.contains("progress") {
        Command::Status
    } else {
        Command::Other
    }
}

/// Normalize a requested identity to a bare slug, accepting the fully
/// qualified form under `parent_domain`.
pub fn parse_identity(text: &str, parent_domain: &str) -> Result<String, IncubatorError> {
    let lower = text.trim().to_lowercase();
    let suffix = format!(".{parent_domain}");
    let slug = lower.strip_suffix(&suffix).unwrap_or(&lower).to_string();
    validate_slug(&slug)?;
    Ok(slug)
}

pub fn parse_treasury_amount(text: &str) -> Result<Decimal, IncubatorError> {
    let amount = parse_human_amount(text)?;
    if amount < TREASURY_MIN || amount > TREASURY_MAX {
        return Err(IncubatorError::TreasuryOutOfRange {
            amount: amount.normalize().to_string(),
            min: TREASURY_MIN.to_string(),
            max: TREASURY_MAX.to_string(),
        });
    }
    Ok(amount)
}

/// Months from input such as `"12 months"`, `"18"` or `"2 years"`.
pub fn parse_vesting_months(text: &str) -> Result<u32, IncubatorError> {
    let not_months = || IncubatorError::InvalidAmount(format!("'{}' is not a number of months", text.trim()));
    let start = text.find(|c: char| c.is_ascii_digit()).ok_or_else(not_months)?;
    let digits = &text[start..];
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    // whole, non-negative months only
    let negative = text[..start].trim_end().ends_with('-');
    let fractional = matches!(digits[end..].chars().next(), Some('.' | ','))
        && digits[end + 1..].starts_with(|c: char| c.is_ascii_digit());
    if negative || fractional {
        return Err(not_months());
    }
    let value: u32 = digits[..end].parse().map_err(|_| not_months())?;
    let months = if text.to_lowercase().contains("year") {
        value.saturating_mul(12)
    } else {
        value
    };
    if !(MIN_VESTING_MONTHS..=MAX_VESTING_MONTHS).contains(&months) {
        return Err(IncubatorError::InvalidVestingPeriod(months));
    }
    Ok(months)
}

/// Opening message for a new session.
pub fn greeting(session: &Session, config: &IncubatorConfig) -> Response {
    let mut response = prompt(session, config);
    response.message = format!(
        "Welcome! Let's incubate \"{}\". {}",
        session.project_name, response.message
    );
    response
}

/// Guidance text for the session's current step.
pub fn prompt(session: &Session, config: &IncubatorConfig) -> Response {
    match session.step() {
        ConversationStep::AskIdentityName => {
            let suggestion = slugify(&session.project_name);
            let mut response = Response::text(
                format!(
                    "What name should your project use? It becomes <name>.{}. \
                     Use 3-32 lowercase letters, numbers or hyphens.",
                    config.parent_domain
                ),
                &[],
            );
            if validate_slug(&suggestion).is_ok() {
                response.suggestions.push(suggestion);
            }
            response
        }
        ConversationStep::AskTreasuryAmount => Response::text(
            format!(
                "How much USDC should the treasury hold? Between {} and {}.",
                format_usd(TREASURY_MIN),
                format_usd(TREASURY_MAX)
            ),
            &["$10,000", "$50,000", "$100,000"],
        ),
        ConversationStep::AskVestingPeriod => Response::text(
            format!(
                "How long should locked liquidity vest? Between {MIN_VESTING_MONTHS} and \
                 {MAX_VESTING_MONTHS} months."
            ),
            &["6 months", "12 months", "24 months"],
        ),
        ConversationStep::ConfirmConfig => Response::text(
            format!(
                "Please confirm your configuration:\n{}\nReply \"confirm\" to start incubation \
                 or \"change <field>\" to edit.",
                config_summary(&session.configuration, config)
            ),
            &["Confirm", "Change name", "Change treasury", "Change vesting"],
        ),
        ConversationStep::Incubating => Response::text(
            "Reply \"continue\" to run the next step or \"status\" for progress.",
            &["Continue", "Status"],
        ),
        ConversationStep::Completed => Response::text(
            format!(
                "\"{}\" has completed incubation and is launched.",
                session.project_name
            ),
            &["Status"],
        ),
    }
}

/// The three founder-chosen values.
fn config_summary(configuration: &Configuration, config: &IncubatorConfig) -> String {
    let identity = configuration
        .identity_slug
        .as_deref()
        .map(|s| full_name(s, &config.parent_domain))
        .unwrap_or_else(|| "-".into());
    let treasury = configuration
        .treasury_amount
        .map(format_usd)
        .unwrap_or_else(|| "-".into());
    let vesting = configuration
        .vesting_months
        .map(|m| format!("{m} months"))
        .unwrap_or_else(|| "-".into());
    format!("- Identity: {identity}\n- Treasury: {treasury}\n- Vesting: {vesting}")
}

/// Re-prompt the current step with an explanation.
pub fn reject(session: &Session, config: &IncubatorConfig, reason: &str) -> Response {
    warn!(session_id = %session.id, step = ?session.step(), reason, "input rejected");
    let mut response = prompt(session, config);
    response.message = format!("{reason}. {}", response.message);
    response
}

/// Apply one founder message to the session.
pub fn handle_input(session: &mut Session, text: &str, config: &IncubatorConfig) -> Response {
    let before = Snapshot::capture(session);
    let mut response = dispatch(session, text, config);
    response.patch = before.patch(session);
    response
}

fn dispatch(session: &mut Session, text: &str, config: &IncubatorConfig) -> Response {
    let command = classify(text);
    match session.step() {
        ConversationStep::AskIdentityName => match parse_identity(text, &config.parent_domain) {
            Ok(slug) => {
                session.configuration.identity_slug = Some(slug);
                advance(session, config, ConversationStep::AskTreasuryAmount)
            }
            Err(e) => reject(session, config, &e.to_string()),
        },
        ConversationStep::AskTreasuryAmount => match parse_treasury_amount(text) {
            Ok(amount) => {
                session.configuration.treasury_amount = Some(amount);
                advance(session, config, ConversationStep::AskVestingPeriod)
            }
            Err(e) => reject(session, config, &e.to_string()),
        },
        ConversationStep::AskVestingPeriod => match parse_vesting_months(text) {
            Ok(months) => {
                session.configuration.vesting_months = Some(months);
                advance(session, config, ConversationStep::ConfirmConfig)
            }
            Err(e) => reject(session, config, &e.to_string()),
        },
        ConversationStep::ConfirmConfig => match command {
            Command::Confirm => {
                if session.configuration.liquidity_share_pct.is_none() {
                    session.configuration.liquidity_share_pct = Some(config.liquidity_share_pct);
                }
                session.set_step(ConversationStep::Incubating);
                info!(session_id = %session.id, stage = %session.stage(), "incubation started");
                Response::text(
                    format!(
                        "Configuration confirmed:\n{}\nIncubation has started. Reply \"continue\" \
                         to run the first step.",
                        config_summary(&session.configuration, config)
                    ),
                    &["Continue", "Status"],
                )
            }
            Command::Change(field) => {
                let step = match field {
                    Field::Identity => ConversationStep::AskIdentityName,
                    Field::Treasury => ConversationStep::AskTreasuryAmount,
                    Field::Vesting => ConversationStep::AskVestingPeriod,
                };
                session.set_step(step);
                prompt(session, config)
            }
            _ => prompt(session, config),
        },
        ConversationStep::Incubating => match command {
            Command::Continue => run_next(session, config),
            Command::Status => Response::text(status_summary(session), &["Continue"]),
            _ => prompt(session, config),
        },
        ConversationStep::Completed => match command {
            Command::Status => Response::text(status_summary(session), &[]),
            _ => prompt(session, config),
        },
    }
}

/// Move on after accepting a field. A field re-entered through `change`
/// returns straight to confirmation once everything is filled in.
fn advance(session: &mut Session, config: &IncubatorConfig, natural_next: ConversationStep) -> Response {
    let next = if session.configuration.is_complete() {
        ConversationStep::ConfirmConfig
    } else {
        natural_next
    };
    session.set_step(next);
    prompt(session, config)
}

fn run_next(session: &mut Session, config: &IncubatorConfig) -> Response {
    if let Some(active) = session.in_flight() {
        let mut response = Response::text(
            format!(
                "Still waiting on \"{}\" ({}). Sign the pending transactions or reset.",
                active.description, active.status
            ),
            &["Status", "Reset"],
        );
        response.transactions = active.transactions.clone();
        response.action = Some(active.clone());
        return response;
    }

    let Some(kind) = session.next_action() else {
        session.set_step(ConversationStep::Completed);
        info!(session_id = %session.id, "incubation completed");
        return Response::text(
            format!(
                "Congratulations! \"{}\" has completed incubation and is now launched.",
                session.project_name
            ),
            &["Status"],
        );
    };

    let ctx = IncubationContext {
        founder: session.founder,
        configuration: &session.configuration,
        config,
    };
    let transactions = match build_action(kind, &ctx) {
        Ok(txs) => txs,
        // A bad value can be fixed and retried; anything else needs the
        // operator to finish the deployment.
        Err(e) if e.is_validation() => {
            info!(session_id = %session.id, action = %kind, error = %e, "action rejected a configured value");
            return Response::text(
                format!(
                    "Cannot prepare \"{}\": {e}. Correct the value and reply \"continue\" to retry.",
                    kind.description()
                ),
                &["Continue", "Status"],
            );
        }
        Err(e) => {
            warn!(session_id = %session.id, action = %kind, error = %e, "could not prepare action");
            return Response::text(
                format!("Cannot prepare \"{}\": {e}", kind.description()),
                &["Status"],
            );
        }
    };

    match session.begin_action(kind, transactions.clone()) {
        Ok(action) => {
            let step = pipeline::position(kind).map(|p| p + 1).unwrap_or(0);
            info!(session_id = %session.id, action = %kind, step, "action dispatched");
            let mut response = Response::text(
                format!(
                    "Step {step}/{}: {}. Please sign {} transaction(s).",
                    INCUBATION_PIPELINE.len(),
                    action.description,
                    transactions.len()
                ),
                &["Status"],
            );
            response.action = Some(action);
            response.transactions = transactions;
            response
        }
        Err(e) => Response::text(e.to_string(), &["Status"]),
    }
}

/// Progress report: completed count, stage, and each pipeline step.
pub fn status_summary(session: &Session) -> String {
    let mut lines = vec![
        format!(
            "Project \"{}\" progress: {}/{} steps completed.",
            session.project_name,
            session.completed_count(),
            INCUBATION_PIPELINE.len()
        ),
        format!("Stage: {}", session.stage()),
    ];
    for kind in INCUBATION_PIPELINE {
        let latest = session.actions().iter().filter(|a| a.kind == kind).last();
        let state = if session.actions().has_completed(kind) {
            "completed".to_string()
        } else {
            match latest {
                Some(a) if a.status == ActionStatus::Failed => format!(
                    "failed ({})",
                    a.error.as_deref().unwrap_or("unknown error")
                ),
                Some(a) => a.status.to_string(),
                None => "not started".to_string(),
            }
        };
        lines.push(format!("- {}: {state}", kind.description()));
    }
    lines.join("\n")
}

/// Result text recorded on a completed action.
pub fn action_result_text(kind: ActionType, session: &Session, config: &IncubatorConfig) -> String {
    let cfg = &session.configuration;
    match kind {
        ActionType::MintIdentity => match cfg.identity_slug.as_deref() {
            Some(slug) => format!("Identity {} registered", full_name(slug, &config.parent_domain)),
            None => "Identity registered".to_string(),
        },
        ActionType::SetupTreasury => match cfg.treasury_amount {
            Some(amount) => format!("Treasury funded with {}", format_usd(amount)),
            None => "Treasury configured".to_string(),
        },
        ActionType::OpenChannel => {
            format!("Payment channel opened with {} USDC", config.channel_deposit)
        }
        ActionType::ApproveBudget => match cfg.treasury_amount {
            Some(amount) => format!("Initial budget of {} proposed", format_usd(amount)),
            None => "Initial budget proposed".to_string(),
        },
        ActionType::ProcessPayment => "Payment processed successfully".to_string(),
        ActionType::DeployPool => "Liquidity pool deployed".to_string(),
        ActionType::LockLiquidity => match cfg.vesting_months {
            Some(months) => format!("Liquidity locked ({months} month vesting)"),
            None => "Liquidity locked".to_string(),
        },
        ActionType::VerifyVesting => "Vesting schedule verified".to_string(),
    }
}
