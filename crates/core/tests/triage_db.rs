use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use tempfile::tempdir;
use triage_core::config::AnalysisConfig;
use triage_core::db::{DbError, TriageDb, CURRENT_SCHEMA_VERSION};
use triage_core::hash::Frame;
use triage_core::services::{run_triage, ListingHost, TriageReport};
use triage_core::{Architecture, ProcessorFlags};

const LISTING: &str = "
00401000 8b08            mov     ecx,dword ptr [eax]
00401002 8bd1            mov     edx,ecx
00401004 c3              ret
";

fn report_for(frames: &[Frame]) -> TriageReport {
    let host = ListingHost::parse(LISTING, Architecture::X86, ProcessorFlags::unknown())
        .expect("listing");
    run_triage(&host, 0x401000, frames, &AnalysisConfig::default()).expect("triage")
}

#[test]
fn open_creates_schema_at_current_version() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("crashes.db");

    let db = TriageDb::open(&path).expect("open db");
    assert_eq!(db.schema_version().expect("version"), CURRENT_SCHEMA_VERSION);
    drop(db);

    // Reopening an up-to-date database is a no-op.
    let db = TriageDb::open(&path).expect("reopen db");
    assert_eq!(db.schema_version().expect("version"), CURRENT_SCHEMA_VERSION);
    assert!(db.list_buckets().expect("buckets").is_empty());
}

#[test]
fn rejects_newer_schema() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("future.db");
    {
        let conn = Connection::open(&path).expect("raw open");
        conn.execute_batch("PRAGMA user_version = 99;").expect("bump version");
    }

    let err = TriageDb::open(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion { found, max_supported, .. } => {
            assert_eq!(found, 99);
            assert_eq!(max_supported, CURRENT_SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn upgrades_version_one_database() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("v1.db");
    {
        let conn = Connection::open(&path).expect("raw open");
        conn.execute_batch(
            r#"
            CREATE TABLE crashes (
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
            INSERT INTO crashes (
                major_hash, minor_hash, architecture, fault_address,
                instruction, tainted_inputs, status, recorded_at
            )
            VALUES (1, 2, 'x86', 4198400, 'mov ecx,dword ptr [eax]', '["eax"]', 'completed',
                    '2024-01-01T00:00:00+00:00');
            PRAGMA user_version = 1;
            "#,
        )
        .expect("v1 schema");
    }

    let db = TriageDb::open(&path).expect("upgrade");
    assert_eq!(db.schema_version().expect("version"), CURRENT_SCHEMA_VERSION);

    let buckets = db.list_buckets().expect("buckets");
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].hash_mode, "sha256");
    assert_eq!(buckets[0].bucket(), "0x00000001.0x00000002");

    let crashes = db.crashes_in_bucket(1, 2).expect("crashes");
    assert_eq!(crashes[0].fault_address, 0x401000);
    assert_eq!(crashes[0].tainted_inputs, vec!["eax".to_string()]);
}

#[test]
fn buckets_group_crashes_by_hash() {
    let db = TriageDb::open_in_memory().expect("db");
    let common = report_for(&[Frame::resolved("app!crash_here", 0)]);
    let rare = report_for(&[Frame::resolved("app!elsewhere", 0x10)]);

    let day = |d| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).single().expect("timestamp");
    db.record_crash_at(&common, day(1)).expect("record");
    db.record_crash_at(&rare, day(2)).expect("record");
    db.record_crash_at(&common, day(3)).expect("record");

    let buckets = db.list_buckets().expect("buckets");
    assert_eq!(buckets.len(), 2);

    let top = &buckets[0];
    assert_eq!(top.major_hash, common.stack_hash.major);
    assert_eq!(top.minor_hash, common.stack_hash.minor);
    assert_eq!(top.count, 2);
    assert_eq!(top.hash_mode, "sha256");
    assert!(top.first_seen.starts_with("2024-03-01"));
    assert!(top.last_seen.starts_with("2024-03-03"));
    assert_eq!(top.bucket(), common.stack_hash.to_string());

    assert_eq!(buckets[1].count, 1);
}

#[test]
fn crashes_in_bucket_returns_rows_oldest_first() {
    let db = TriageDb::open_in_memory().expect("db");
    let report = report_for(&[Frame::resolved("app!crash_here", 0)]);
    let first = db.record_crash(&report).expect("first");
    let second = db.record_crash(&report).expect("second");

    let crashes =
        db.crashes_in_bucket(report.stack_hash.major, report.stack_hash.minor).expect("query");
    let ids: Vec<i64> = crashes.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first, second]);

    let crash = &crashes[0];
    assert_eq!(crash.architecture, "x86");
    assert!(crash.instruction.contains("mov     ecx,dword ptr [eax]"));
    assert_eq!(crash.bucket(), report.stack_hash.to_string());

    assert!(db.crashes_in_bucket(0xdead, 0xbeef).expect("empty query").is_empty());
}
