//! Project identity: subdomain names under the incubator's parent domain.

use alloy::primitives::{Address, B256, keccak256};
use alloy::sol_types::SolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::prepared;
use crate::chain::Chain;
use crate::contracts::INameRegistry;
use crate::error::IncubatorError;
use crate::pool_key::short_address;
use crate::types::{PreparedTx, ReadCall, Stage};

pub const MIN_SLUG_LEN: usize = 3;
pub const MAX_SLUG_LEN: usize = 32;

/// Text record key the manifest is published under.
pub const MANIFEST_RECORD_KEY: &str = "consul.manifest";

/// Recursive name hash: `node = keccak256(node ++ keccak256(label))` from the
/// rightmost label; the empty name hashes to zero.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(labelhash(label).as_slice());
        node = keccak256(buf);
    }
    node
}

pub fn labelhash(label: &str) -> B256 {
    keccak256(label.as_bytes())
}

/// Accept `^[a-z0-9-]{3,32}$` without a leading or trailing hyphen.
pub fn validate_slug(slug: &str) -> Result<(), IncubatorError> {
    if slug.len() < MIN_SLUG_LEN {
        return Err(IncubatorError::InvalidIdentity(format!(
            "'{slug}' must be at least {MIN_SLUG_LEN} characters"
        )));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(IncubatorError::InvalidIdentity(format!(
            "'{slug}' must be {MAX_SLUG_LEN} characters or less"
        )));
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(IncubatorError::InvalidIdentity(format!(
            "'{slug}' may only contain lowercase letters, numbers, and hyphens"
        )));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(IncubatorError::InvalidIdentity(format!(
            "'{slug}' cannot start or end with a hyphen"
        )));
    }
    Ok(())
}

/// Suggest a slug for a free-form project name. The result may still fail
/// [`validate_slug`] (e.g. a two-letter name).
pub fn slugify(project_name: &str) -> String {
    let mut slug = String::with_capacity(project_name.len());
    let mut last_hyphen = false;
    for ch in project_name.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            if !last_hyphen {
                slug.push('-');
                last_hyphen = true;
            }
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            last_hyphen = false;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_matches('-').to_string()
}

pub fn full_name(slug: &str, parent_domain: &str) -> String {
    format!("{slug}.{parent_domain}")
}

/// `setSubnodeRecord(parent, label, founder, resolver, 0)` on the registry.
pub fn register_identity(
    slug: &str,
    parent_domain: &str,
    founder: Address,
    registry: Address,
    resolver: Address,
    chain: Chain,
) -> Result<PreparedTx, IncubatorError> {
    validate_slug(slug)?;
    let call = INameRegistry::setSubnodeRecordCall {
        node: namehash(parent_domain),
        label: labelhash(slug),
        owner: founder,
        resolver,
        ttl: 0,
    };
    Ok(prepared(
        registry,
        call.abi_encode(),
        chain,
        format!(
            "Register {} for {}",
            full_name(slug, parent_domain),
            short_address(&founder)
        ),
    ))
}

pub fn owner_call(name: &str, registry: Address) -> ReadCall {
    let call = INameRegistry::ownerCall { node: namehash(name) };
    ReadCall {
        to: registry,
        data: call.abi_encode().into(),
    }
}

pub fn decode_owner(data: &[u8]) -> Result<Address, IncubatorError> {
    Ok(INameRegistry::ownerCall::abi_decode_returns(data)?)
}

/// Project metadata published as a text record on the identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    pub name: String,
    pub description: String,
    pub founder: Address,
    pub created_at: DateTime<Utc>,
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<Address>,
}

impl ProjectManifest {
    pub fn new(name: &str, founder: Address, stage: Stage, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            description: format!("{name} - Incubated by ConsulDAO"),
            founder,
            created_at,
            stage,
            website: None,
            github: None,
            token_symbol: None,
            token_address: None,
        }
    }

    pub fn to_json(&self) -> Result<String, IncubatorError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, IncubatorError> {
        Ok(serde_json::from_str(json)?)
    }
}
