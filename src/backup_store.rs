//! Secondary keyed storage for backup payloads.

use std::path::Path;

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::clock::{format_rfc3339, parse_rfc3339};
use crate::db::{self, BackupRecord};
use crate::domain::backup::BackupKind;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBackup {
    pub key: String,
    pub kind: BackupKind,
    pub created_at: Option<OffsetDateTime>,
    pub payload: String,
}

pub trait BackupStore {
    fn save(&self, backup: &StoredBackup) -> Result<(), StoreError>;

    fn load(&self, key: &str) -> Result<Option<StoredBackup>, StoreError>;

    /// Keys oldest first.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub struct SqliteBackupStore {
    conn: Connection,
}

impl SqliteBackupStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = db::open_backup_connection(path)?;
        Ok(Self { conn })
    }
}

impl BackupStore for SqliteBackupStore {
    fn save(&self, backup: &StoredBackup) -> Result<(), StoreError> {
        let created_at = backup.created_at.map(format_rfc3339).unwrap_or_default();
        db::insert_backup(
            &self.conn,
            &BackupRecord {
                key: backup.key.clone(),
                kind: backup.kind.as_str().to_string(),
                created_at,
                payload: backup.payload.clone(),
            },
        )?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<StoredBackup>, StoreError> {
        let Some(record) = db::get_backup(&self.conn, key)? else {
            return Ok(None);
        };
        let kind = if record.kind == BackupKind::Manual.as_str() {
            BackupKind::Manual
        } else {
            BackupKind::Auto
        };
        Ok(Some(StoredBackup {
            key: record.key,
            kind,
            created_at: parse_rfc3339(&record.created_at),
            payload: record.payload,
        }))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(db::list_backup_keys(&self.conn)?)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        db::delete_backup(&self.conn, key)?;
        Ok(())
    }
}
