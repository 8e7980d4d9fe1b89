use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{PidStore, StoreError};
use crate::pid::{Pid, PidStatus};

type Key = (String, String);

/// Process-local PID table, used by tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryPidStore {
    rows: RwLock<BTreeMap<Key, Pid>>,
}

impl InMemoryPidStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(scheme: &str, identifier: &str) -> Key {
        (scheme.to_string(), identifier.to_string())
    }

    fn filtered(&self, predicate: impl Fn(&Pid) -> bool) -> Result<Vec<Pid>, StoreError> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.values().filter(|p| predicate(p)).cloned().collect())
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Storage("PID table lock poisoned".to_string())
}

impl PidStore for InMemoryPidStore {
    fn get(&self, scheme: &str, identifier: &str) -> Result<Option<Pid>, StoreError> {
        let rows = self.rows.read().map_err(poisoned)?;
        Ok(rows.get(&Self::key(scheme, identifier)).cloned())
    }

    fn insert(&self, pid: &Pid) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        let key = Self::key(&pid.scheme, &pid.identifier);
        if rows.contains_key(&key) {
            return Err(StoreError::already_exists(pid));
        }
        rows.insert(key, pid.clone());
        Ok(())
    }

    fn update(&self, pid: &Pid) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        match rows.get_mut(&Self::key(&pid.scheme, &pid.identifier)) {
            Some(row) => {
                *row = pid.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(pid)),
        }
    }

    fn remove(&self, scheme: &str, identifier: &str) -> Result<Option<Pid>, StoreError> {
        let mut rows = self.rows.write().map_err(poisoned)?;
        Ok(rows.remove(&Self::key(scheme, identifier)))
    }

    fn list_by_status(&self, status: PidStatus) -> Result<Vec<Pid>, StoreError> {
        self.filtered(|p| p.status == status)
    }

    fn list_for_record(&self, record_id: &str) -> Result<Vec<Pid>, StoreError> {
        self.filtered(|p| p.record_id.as_deref() == Some(record_id))
    }
}
