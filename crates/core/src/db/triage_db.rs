use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{BucketSummary, CrashRecord, DbError, DbResult};
use crate::services::TriageReport;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// SQLite-backed crash bucket store.
#[derive(Debug)]
pub struct TriageDb {
    conn: Connection,
}

impl TriageDb {
    /// Open (or create) a crash database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn schema_version(&self) -> DbResult<i32> {
        current_schema_version(&self.conn)
    }

    /// Store a triage report, timestamped now. Returns the new row id.
    pub fn record_crash(&self, report: &TriageReport) -> DbResult<i64> {
        self.record_crash_at(report, Utc::now())
    }

    pub fn record_crash_at(&self, report: &TriageReport, at: DateTime<Utc>) -> DbResult<i64> {
        let (instruction, tainted_inputs) = match report.faulting_instruction() {
            Some(fault) => (fault.text.as_str(), fault.tainted_input.names()),
            None => ("", Vec::new()),
        };
        let tainted_json = serde_json::to_string(&tainted_inputs)?;

        self.conn.execute(
            r#"
            INSERT INTO crashes (
                major_hash, minor_hash, hash_mode, architecture, fault_address,
                instruction, tainted_inputs, status, recorded_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                i64::from(report.stack_hash.major),
                i64::from(report.stack_hash.minor),
                report.stack_hash.mode.as_str(),
                report.architecture.as_str(),
                report.fault_address as i64,
                instruction,
                tainted_json,
                report.status.as_str(),
                at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All buckets, largest first.
    pub fn list_buckets(&self) -> DbResult<Vec<BucketSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT major_hash, minor_hash, hash_mode, COUNT(*), MIN(recorded_at), MAX(recorded_at)
            FROM crashes
            GROUP BY major_hash, minor_hash, hash_mode
            ORDER BY COUNT(*) DESC, major_hash, minor_hash
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(BucketSummary {
                major_hash: row.get::<_, i64>(0)? as u32,
                minor_hash: row.get::<_, i64>(1)? as u32,
                hash_mode: row.get(2)?,
                count: row.get::<_, i64>(3)? as u64,
                first_seen: row.get(4)?,
                last_seen: row.get(5)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Crashes with the given hash pair, oldest first.
    pub fn crashes_in_bucket(&self, major: u32, minor: u32) -> DbResult<Vec<CrashRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, major_hash, minor_hash, hash_mode, architecture, fault_address,
                   instruction, tainted_inputs, status, recorded_at
            FROM crashes
            WHERE major_hash = ?1 AND minor_hash = ?2
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![i64::from(major), i64::from(minor)], |row| {
            Ok((
                CrashRecord {
                    id: row.get(0)?,
                    major_hash: row.get::<_, i64>(1)? as u32,
                    minor_hash: row.get::<_, i64>(2)? as u32,
                    hash_mode: row.get(3)?,
                    architecture: row.get(4)?,
                    fault_address: row.get::<_, i64>(5)? as u64,
                    instruction: row.get(6)?,
                    tainted_inputs: Vec::new(),
                    status: row.get(8)?,
                    recorded_at: row.get(9)?,
                },
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (mut record, tainted_json) = row?;
            record.tainted_inputs = serde_json::from_str(&tainted_json)?;
            out.push(record);
        }
        Ok(out)
    }
}

/// Apply schema migrations using `PRAGMA user_version`.
///
/// - 1: crashes table
/// - 2: hash mode column and bucket index
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS crashes (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                major_hash     INTEGER NOT NULL,
                minor_hash     INTEGER NOT NULL,
                architecture   TEXT NOT NULL,
                fault_address  INTEGER NOT NULL,
                instruction    TEXT NOT NULL,
                tainted_inputs TEXT NOT NULL,
                status         TEXT NOT NULL,
                recorded_at    TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        if !column_exists(conn, "crashes", "hash_mode")? {
            conn.execute_batch(
                "ALTER TABLE crashes ADD COLUMN hash_mode TEXT NOT NULL DEFAULT 'sha256';",
            )?;
        }
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE INDEX IF NOT EXISTS idx_crashes_bucket ON crashes (major_hash, minor_hash);
            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let pragma = format!("PRAGMA table_info({table});");
    let mut stmt = conn.prepare(&pragma)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in rows {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}
