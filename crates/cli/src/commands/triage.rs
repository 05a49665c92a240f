use std::path::Path;

use anyhow::{anyhow, Context, Result};
use triage_core::db::TriageDb;
use triage_core::services::{run_and_record, run_triage, TriageReport};

use crate::commands::{print_instruction, print_stack_hash, print_status};
use crate::{load_config, load_listing, parse_address_arg, parse_frames_file};

/// Full triage of one crash, optionally recorded in a crash database.
pub fn triage_command(
    listing: &str,
    frames: &str,
    config_path: Option<&str>,
    start: Option<&str>,
    db_path: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let host = load_listing(listing, &config)?;
    let frames = parse_frames_file(Path::new(frames))?;
    let fault = match start {
        Some(text) => parse_address_arg(text)?,
        None => host.first_address().ok_or_else(|| anyhow!("Listing {listing} is empty"))?,
    };

    let (report, crash_id) = match db_path {
        Some(db_path) => {
            let db = TriageDb::open(Path::new(db_path))
                .with_context(|| format!("Failed to open crash database at {db_path}"))?;
            let (report, id) = run_and_record(&host, fault, &frames, &config, &db)
                .with_context(|| format!("Failed to triage crash at {fault:#x}"))?;
            (report, Some(id))
        }
        None => {
            let report = run_triage(&host, fault, &frames, &config)
                .with_context(|| format!("Failed to triage crash at {fault:#x}"))?;
            (report, None)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_report(&report);
    if let Some(id) = crash_id {
        println!("Recorded crash #{id}");
    }
    Ok(())
}

fn print_report(report: &TriageReport) {
    println!("Fault at {:#x} ({})", report.fault_address, report.architecture);
    if let Some(fault) = report.faulting_instruction() {
        println!("Faulting instruction: {}", fault.text);
        println!("Tainted inputs: {}", fault.tainted_input);
    }
    println!();
    for instruction in report.tainted_instructions() {
        print_instruction(instruction);
    }
    print_status(report.status);
    print_stack_hash(&report.stack_hash);
}
