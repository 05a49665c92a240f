use anyhow::{anyhow, Context, Result};
use triage_core::services::{build_basic_block, InstructionReport};
use triage_core::taint::{self, TaintStatus, VirtualStack};
use triage_core::OperandSet;

use crate::commands::print_instruction;
use crate::{load_config, load_listing, parse_address_arg};

#[derive(Debug, serde::Serialize)]
struct TaintSummary {
    status: TaintStatus,
    succeeded: bool,
    instructions: Vec<InstructionReport>,
    taint: OperandSet,
    clear: OperandSet,
    stack: VirtualStack,
}

/// Build a block from a listing and propagate taint from its first
/// instruction.
pub fn taint_command(
    listing: &str,
    config_path: Option<&str>,
    start: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let host = load_listing(listing, &config)?;
    let start = match start {
        Some(text) => parse_address_arg(text)?,
        None => host.first_address().ok_or_else(|| anyhow!("Listing {listing} is empty"))?,
    };

    let mut block = build_basic_block(&host, start, &config)
        .with_context(|| format!("Failed to build basic block at {start:#x}"))?;
    let outcome =
        taint::assign_taint(config.architecture, config.taint_destination_pointers, &mut block);

    let summary = TaintSummary {
        status: outcome.status,
        succeeded: outcome.succeeded(),
        instructions: block.iter().map(InstructionReport::from).collect(),
        taint: outcome.taint,
        clear: outcome.clear,
        stack: outcome.stack,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for report in &summary.instructions {
        print_instruction(report);
    }
    println!();
    print_status(summary.status);
    println!("Tainted at end of block: {}", summary.taint);
    println!("Known clean at end of block: {}", summary.clear);
    Ok(())
}

pub fn print_status(status: TaintStatus) {
    match status {
        TaintStatus::Completed => println!("Taint analysis: completed"),
        TaintStatus::TaintExhausted { at } => {
            println!("Taint analysis: taint exhausted at instruction {at}")
        }
        TaintStatus::UnsupportedStackShape { at } => {
            println!("Taint analysis: FAILED, unsupported stack operand at instruction {at}")
        }
    }
}
