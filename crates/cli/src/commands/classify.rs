use anyhow::{Context, Result};
use triage_core::disasm;
use triage_core::model::{Instruction, OperandSet, ProcessorFlags};
use triage_core::services::InstructionReport;

use crate::{parse_architecture, parse_flags};

/// Classify individual disassembly lines.
///
/// Lines are `address opcode mnemonic arguments` unless `bare` is set, in
/// which case they are just `mnemonic arguments`.
pub fn classify_command(
    arch: &str,
    flags: Option<&str>,
    bare: bool,
    lines: &[String],
    json: bool,
) -> Result<()> {
    let arch = parse_architecture(arch)?;
    let flags = match flags {
        Some(text) => parse_flags(text)?,
        None => ProcessorFlags::unknown(),
    };

    let mut reports = Vec::with_capacity(lines.len());
    for line in lines {
        let instruction = if bare {
            let line = line.trim();
            let (mnemonic, arguments) = line.split_once(' ').unwrap_or((line, ""));
            let mut instruction = Instruction::synthetic(mnemonic, arguments.trim());
            instruction.flags_valid = flags.valid;
            disasm::classify(&mut instruction, arch, &flags);
            instruction
        } else {
            disasm::disassemble(line, None, arch, flags.valid, &flags)
                .with_context(|| format!("Failed to classify '{line}'"))?
        };
        reports.push(InstructionReport::from(&instruction));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        print_instruction(report);
    }
    Ok(())
}

/// Print one instruction with its operand sets, skipping empty ones.
pub fn print_instruction(report: &InstructionReport) {
    println!("{}", report.text);
    println!("  class: {}", report.class);
    print_set("source", &report.source);
    print_set("destination", &report.destination);
    print_set("destination_pointer", &report.destination_pointer);
    print_set("passed_or_returned", &report.passed_or_returned);
    print_set("tainted_input", &report.tainted_input);
    if report.flags_modified {
        println!("  modifies flags");
    }
}

fn print_set(label: &str, set: &OperandSet) {
    if !set.is_empty() {
        println!("  {label}: {set}");
    }
}
