use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{PidStore, StoreError};
use crate::pid::{Pid, PidStatus};

const COLUMNS: &str = "scheme, identifier, provider, client, status, record_id";

/// SQLite-backed implementation of the PidStore trait.
pub struct SqlitePidStore {
    conn: Mutex<Connection>,
}

impl SqlitePidStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn =
            Connection::open(path).map_err(|e| StoreError::Storage(format!("open: {}", e)))?;
        Self::init_with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("open_in_memory: {}", e)))?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS pids (
                scheme TEXT NOT NULL,
                identifier TEXT NOT NULL,
                provider TEXT NOT NULL,
                client TEXT,
                status TEXT NOT NULL,
                record_id TEXT,
                created INTEGER NOT NULL,
                modified INTEGER NOT NULL,
                PRIMARY KEY (scheme, identifier)
            );

            CREATE INDEX IF NOT EXISTS idx_pids_status ON pids(status);
            CREATE INDEX IF NOT EXISTS idx_pids_record ON pids(record_id);
            ",
        )
        .map_err(|e| StoreError::Storage(format!("init_schema: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Storage("connection lock poisoned".to_string()))
    }

    fn select(&self, filter: &str, value: &str) -> Result<Vec<Pid>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM pids WHERE {} = ?1 ORDER BY scheme, identifier",
            COLUMNS, filter
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map(params![value], row_to_pid)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}

fn row_to_pid(row: &Row<'_>) -> rusqlite::Result<Pid> {
    let code: String = row.get(4)?;
    let status = PidStatus::from_code(&code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown PID status code '{}'", code).into(),
        )
    })?;
    Ok(Pid {
        scheme: row.get(0)?,
        identifier: row.get(1)?,
        provider: row.get(2)?,
        client: row.get(3)?,
        status,
        record_id: row.get(5)?,
    })
}

impl PidStore for SqlitePidStore {
    fn get(&self, scheme: &str, identifier: &str) -> Result<Option<Pid>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM pids WHERE scheme = ?1 AND identifier = ?2",
                COLUMNS
            ),
            params![scheme, identifier],
            row_to_pid,
        )
        .optional()
        .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn insert(&self, pid: &Pid) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let now = Utc::now().timestamp_millis();
        let result = conn.execute(
            "INSERT INTO pids (scheme, identifier, provider, client, status, record_id, created, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                pid.scheme,
                pid.identifier,
                pid.provider,
                pid.client,
                pid.status.code(),
                pid.record_id,
                now,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::already_exists(pid))
            }
            Err(e) => Err(StoreError::Storage(format!("insert: {}", e))),
        }
    }

    fn update(&self, pid: &Pid) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE pids SET provider = ?3, client = ?4, status = ?5, record_id = ?6, modified = ?7
                 WHERE scheme = ?1 AND identifier = ?2",
                params![
                    pid.scheme,
                    pid.identifier,
                    pid.provider,
                    pid.client,
                    pid.status.code(),
                    pid.record_id,
                    Utc::now().timestamp_millis(),
                ],
            )
            .map_err(|e| StoreError::Storage(format!("update: {}", e)))?;
        if changed == 0 {
            return Err(StoreError::not_found(pid));
        }
        Ok(())
    }

    fn remove(&self, scheme: &str, identifier: &str) -> Result<Option<Pid>, StoreError> {
        let existing = self.get(scheme, identifier)?;
        if existing.is_some() {
            let conn = self.lock()?;
            conn.execute(
                "DELETE FROM pids WHERE scheme = ?1 AND identifier = ?2",
                params![scheme, identifier],
            )
            .map_err(|e| StoreError::Storage(format!("delete: {}", e)))?;
        }
        Ok(existing)
    }

    fn list_by_status(&self, status: PidStatus) -> Result<Vec<Pid>, StoreError> {
        self.select("status", status.code())
    }

    fn list_for_record(&self, record_id: &str) -> Result<Vec<Pid>, StoreError> {
        self.select("record_id", record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doi(identifier: &str) -> Pid {
        Pid::new("doi", identifier, "crossref")
            .with_client(Some("crossref".to_string()))
            .attached_to("rec-1")
    }

    #[test]
    fn test_round_trip_row() {
        let store = SqlitePidStore::open_in_memory().unwrap();
        let pid = doi("10.1234/a").with_status(PidStatus::Reserved);
        store.insert(&pid).unwrap();
        assert_eq!(store.get("doi", "10.1234/a").unwrap(), Some(pid));
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let store = SqlitePidStore::open_in_memory().unwrap();
        store.insert(&doi("10.1234/a")).unwrap();
        assert!(matches!(
            store.insert(&doi("10.1234/a")),
            Err(StoreError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_update_and_remove() {
        let store = SqlitePidStore::open_in_memory().unwrap();
        assert!(matches!(
            store.update(&doi("10.1234/a")),
            Err(StoreError::NotFound { .. })
        ));

        store.insert(&doi("10.1234/a")).unwrap();
        store
            .update(&doi("10.1234/a").with_status(PidStatus::Deleted))
            .unwrap();
        assert_eq!(store.list_by_status(PidStatus::Deleted).unwrap().len(), 1);
        assert_eq!(store.list_for_record("rec-1").unwrap().len(), 1);

        assert!(store.remove("doi", "10.1234/a").unwrap().is_some());
        assert!(store.get("doi", "10.1234/a").unwrap().is_none());
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pids.sqlite");
        {
            let store = SqlitePidStore::open(&path).unwrap();
            store.insert(&doi("10.1234/a")).unwrap();
        }
        let store = SqlitePidStore::open(&path).unwrap();
        assert!(store.get("doi", "10.1234/a").unwrap().is_some());
    }
}
