//! The local PID table
//!
//! Every PID a provider creates is kept here, keyed by `(scheme, identifier)`,
//! together with its status and the record it is attached to. Records only
//! hold the `{identifier, provider, client}` tuple; the status lives here.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::InMemoryPidStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqlitePidStore;

use crate::pid::{Pid, PidStatus};

/// Storage backend for PID rows.
///
/// Implementations are shared between providers via `Arc<dyn PidStore>` and
/// must be safe to call from several threads.
pub trait PidStore: Send + Sync {
    /// Get a PID by scheme and identifier.
    fn get(&self, scheme: &str, identifier: &str) -> Result<Option<Pid>, StoreError>;

    /// Insert a new PID row.
    fn insert(&self, pid: &Pid) -> Result<(), StoreError>;

    /// Replace an existing PID row.
    fn update(&self, pid: &Pid) -> Result<(), StoreError>;

    /// Remove a PID row, returning it if it existed.
    fn remove(&self, scheme: &str, identifier: &str) -> Result<Option<Pid>, StoreError>;

    /// All PIDs with the given status, ordered by scheme and identifier.
    fn list_by_status(&self, status: PidStatus) -> Result<Vec<Pid>, StoreError>;

    /// All PIDs attached to a record.
    fn list_for_record(&self, record_id: &str) -> Result<Vec<Pid>, StoreError>;
}

/// Errors from the PID store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("PID not found: {scheme}:{identifier}")]
    NotFound { scheme: String, identifier: String },

    #[error("PID already exists: {scheme}:{identifier}")]
    AlreadyExists { scheme: String, identifier: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub(crate) fn not_found(pid: &Pid) -> Self {
        StoreError::NotFound {
            scheme: pid.scheme.clone(),
            identifier: pid.identifier.clone(),
        }
    }

    pub(crate) fn already_exists(pid: &Pid) -> Self {
        StoreError::AlreadyExists {
            scheme: pid.scheme.clone(),
            identifier: pid.identifier.clone(),
        }
    }
}
