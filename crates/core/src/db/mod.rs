//! Crash bucket database.
//!
//! A small SQLite store of triaged crashes, keyed by stack hash. Each row is
//! one crash; a bucket is the set of crashes sharing a major/minor hash pair.
//!
//! - `TriageDb`: connection wrapper with schema migrations.
//! - `CrashRecord` / `BucketSummary`: rows and aggregates read back out.

mod models;
mod triage_db;

pub use models::{BucketSummary, CrashRecord};
pub use triage_db::{TriageDb, CURRENT_SCHEMA_VERSION};

use thiserror::Error;

/// Error type for crash database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A stored JSON column could not be encoded or decoded.
    #[error("Stored JSON column is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;
