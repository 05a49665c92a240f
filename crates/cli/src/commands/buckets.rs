use std::path::Path;

use anyhow::{anyhow, Context, Result};
use triage_core::db::TriageDb;

/// Parse a bucket label of the form `0x1234abcd.0x0badf00d`.
pub fn parse_bucket(text: &str) -> Result<(u32, u32)> {
    let parse = |part: &str| {
        let digits = part.trim().trim_start_matches("0x");
        u32::from_str_radix(digits, 16).map_err(|_| anyhow!("Invalid bucket '{text}'"))
    };
    let (major, minor) =
        text.split_once('.').ok_or_else(|| anyhow!("Bucket '{text}' must be MAJOR.MINOR"))?;
    Ok((parse(major)?, parse(minor)?))
}

/// List crash buckets, or the crashes in one bucket.
pub fn buckets_command(db_path: &str, bucket: Option<&str>, json: bool) -> Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Err(anyhow!("Crash database not found at {db_path}"));
    }
    let db = TriageDb::open(path)
        .with_context(|| format!("Failed to open crash database at {db_path}"))?;

    if let Some(bucket) = bucket {
        let (major, minor) = parse_bucket(bucket)?;
        let crashes =
            db.crashes_in_bucket(major, minor).context("Failed to query crash database")?;
        if json {
            println!("{}", serde_json::to_string_pretty(&crashes)?);
            return Ok(());
        }
        if crashes.is_empty() {
            println!("No crashes in bucket {bucket}.");
        }
        for crash in &crashes {
            println!(
                "#{} {} {:#x} {} [{}] tainted: {}",
                crash.id,
                crash.recorded_at,
                crash.fault_address,
                crash.instruction,
                crash.status,
                crash.tainted_inputs.join(", ")
            );
        }
        return Ok(());
    }

    let buckets = db.list_buckets().context("Failed to list crash buckets")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
        return Ok(());
    }
    if buckets.is_empty() {
        println!("No crashes recorded.");
        return Ok(());
    }
    for summary in &buckets {
        println!(
            "{} ({}) count={} first={} last={}",
            summary.bucket(),
            summary.hash_mode,
            summary.count,
            summary.first_seen,
            summary.last_seen
        );
    }
    Ok(())
}
