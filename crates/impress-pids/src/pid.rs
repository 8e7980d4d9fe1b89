//! Persistent identifier model and status state machine
//!
//! Status transitions:
//! ```text
//! New → Reserved → Registered
//!  └──────────────────↗
//! Reserved, Registered → Deleted (soft)
//! Deleted → New, Reserved (restore)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PidError, Result};

/// Lifecycle status of a PID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PidStatus {
    /// Allocated locally, unknown to any registry
    #[default]
    #[serde(rename = "N")]
    New,
    /// Reserved; the value is fixed but not yet public
    #[serde(rename = "K")]
    Reserved,
    /// Registered with its authority
    #[serde(rename = "R")]
    Registered,
    /// Soft-deleted; the row is kept so it can be restored
    #[serde(rename = "D")]
    Deleted,
}

impl PidStatus {
    /// Check if a status transition is valid.
    ///
    /// Staying in the same status is always allowed (operations are idempotent).
    pub fn can_transition_to(&self, target: &PidStatus) -> bool {
        if self == target {
            return true;
        }
        match (self, target) {
            (PidStatus::New, PidStatus::Reserved) => true,
            (PidStatus::New, PidStatus::Registered) => true,

            (PidStatus::Reserved, PidStatus::Registered) => true,
            (PidStatus::Reserved, PidStatus::Deleted) => true,

            (PidStatus::Registered, PidStatus::Deleted) => true,

            // Restore
            (PidStatus::Deleted, PidStatus::New) => true,
            (PidStatus::Deleted, PidStatus::Reserved) => true,

            _ => false,
        }
    }

    /// Get valid next states from current state
    pub fn valid_transitions(&self) -> Vec<PidStatus> {
        match self {
            PidStatus::New => vec![PidStatus::Reserved, PidStatus::Registered],
            PidStatus::Reserved => vec![PidStatus::Registered, PidStatus::Deleted],
            PidStatus::Registered => vec![PidStatus::Deleted],
            PidStatus::Deleted => vec![PidStatus::New, PidStatus::Reserved],
        }
    }

    /// One-letter code used in the PID table
    pub fn code(&self) -> &'static str {
        match self {
            PidStatus::New => "N",
            PidStatus::Reserved => "K",
            PidStatus::Registered => "R",
            PidStatus::Deleted => "D",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(PidStatus::New),
            "K" => Some(PidStatus::Reserved),
            "R" => Some(PidStatus::Registered),
            "D" => Some(PidStatus::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for PidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PidStatus::New => write!(f, "NEW"),
            PidStatus::Reserved => write!(f, "RESERVED"),
            PidStatus::Registered => write!(f, "REGISTERED"),
            PidStatus::Deleted => write!(f, "DELETED"),
        }
    }
}

/// A persistent identifier row as kept in the local PID store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pid {
    /// Identifier namespace, e.g. `doi`
    pub scheme: String,
    /// Literal identifier value
    pub identifier: String,
    /// Name of the provider owning this PID
    pub provider: String,
    /// Registration client/account used by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    pub status: PidStatus,
    /// The record or draft this PID is attached to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl Pid {
    pub fn new(
        scheme: impl Into<String>,
        identifier: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            identifier: identifier.into(),
            provider: provider.into(),
            client: None,
            status: PidStatus::New,
            record_id: None,
        }
    }

    pub fn with_client(mut self, client: Option<String>) -> Self {
        self.client = client;
        self
    }

    pub fn with_status(mut self, status: PidStatus) -> Self {
        self.status = status;
        self
    }

    pub fn attached_to(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn is_new(&self) -> bool {
        self.status == PidStatus::New
    }

    pub fn is_reserved(&self) -> bool {
        self.status == PidStatus::Reserved
    }

    pub fn is_registered(&self) -> bool {
        self.status == PidStatus::Registered
    }

    pub fn is_deleted(&self) -> bool {
        self.status == PidStatus::Deleted
    }

    /// Whether the PID is attached to a record other than `record_id`
    pub fn belongs_to_other(&self, record_id: &str) -> bool {
        matches!(&self.record_id, Some(owner) if owner != record_id)
    }

    /// The `{identifier, provider, client}` tuple stored on a record
    pub fn attrs(&self) -> PidAttrs {
        PidAttrs {
            identifier: self.identifier.clone(),
            provider: self.provider.clone(),
            client: self.client.clone(),
        }
    }

    /// Move to `status`, enforcing the state machine
    pub fn transition(&mut self, status: PidStatus) -> Result<()> {
        if !self.status.can_transition_to(&status) {
            return Err(PidError::InvalidTransition {
                identifier: self.identifier.clone(),
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        Ok(())
    }
}

/// PID attributes as stored on a record/draft under its scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidAttrs {
    pub identifier: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

impl PidAttrs {
    pub fn new(identifier: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            provider: provider.into(),
            client: None,
        }
    }
}

/// `scheme → attrs`, at most one PID per scheme
pub type PidMap = BTreeMap<String, PidAttrs>;

/// Caller-supplied hints for one scheme: an identifier value and/or a
/// provider name. Both are optional; missing values fall back to generation
/// and the scheme's default provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl PidRequest {
    pub fn new(identifier: Option<&str>, provider: Option<&str>) -> Self {
        Self {
            identifier: identifier.map(str::to_string),
            provider: provider.map(str::to_string),
        }
    }

    pub fn identifier(identifier: &str) -> Self {
        Self::new(Some(identifier), None)
    }

    pub fn provider(provider: &str) -> Self {
        Self::new(None, Some(provider))
    }
}

/// `scheme → request`
pub type PidRequestMap = BTreeMap<String, PidRequest>;
