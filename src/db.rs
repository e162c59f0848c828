use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result};

use crate::clock::now_utc_rfc3339;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;
pub const CURRENT_BACKUP_SCHEMA_VERSION: i64 = 1;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "document_store_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    key TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#,
}];

const BACKUP_MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "backup_store_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS backups (
    key TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    created_at TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_backups_created_at ON backups(created_at);
"#,
}];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn, &MIGRATIONS, CURRENT_SCHEMA_VERSION)?;
    Ok(conn)
}

pub fn open_backup_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn, &BACKUP_MIGRATIONS, CURRENT_BACKUP_SCHEMA_VERSION)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(
    conn: &mut Connection,
    migrations: &[Migration],
    schema_version: i64,
) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in migrations {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![schema_version.to_string()],
    )?;

    tx.commit()
}

#[cfg(test)]
pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn get_document(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT body FROM documents WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn put_document(conn: &Connection, key: &str, body: &str, updated_at: &str) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO documents (key, body, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET
    body = excluded.body,
    updated_at = excluded.updated_at
"#,
        params![key, body, updated_at],
    )?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub key: String,
    pub kind: String,
    pub created_at: String,
    pub payload: String,
}

pub fn insert_backup(conn: &Connection, record: &BackupRecord) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO backups (key, kind, created_at, payload)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(key) DO UPDATE SET
    kind = excluded.kind,
    created_at = excluded.created_at,
    payload = excluded.payload
"#,
        params![
            record.key,
            record.kind,
            record.created_at,
            record.payload
        ],
    )?;
    Ok(())
}

pub fn get_backup(conn: &Connection, key: &str) -> Result<Option<BackupRecord>> {
    conn.query_row(
        "SELECT key, kind, created_at, payload FROM backups WHERE key = ?1",
        params![key],
        |row| {
            Ok(BackupRecord {
                key: row.get(0)?,
                kind: row.get(1)?,
                created_at: row.get(2)?,
                payload: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn list_backup_keys(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT key FROM backups ORDER BY created_at ASC, key ASC")?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(row.get(0)?);
    }
    Ok(result)
}

pub fn delete_backup(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM backups WHERE key = ?1", params![key])?;
    Ok(())
}
