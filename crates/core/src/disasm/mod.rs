//! Meta-disassembler: turns one line of rendered disassembly into a
//! classified `Instruction`.
//!
//! Pipeline:
//! - `fields`: split the line into address / opcode / mnemonic / arguments.
//! - `tables`: find the first matching classification row.
//! - `scanner`: file the argument registers into operand sets.
//! - `overrides`: per-row fixups.
//! - `condition`: ARM flag-setting and condition-code suffixes, resolved last
//!   so a skipped or unpredictable instruction keeps its executed class in
//!   `unconditional_class`.

pub mod condition;
pub mod fields;
pub mod overrides;
pub mod registers;
pub mod scanner;
pub mod tables;

use log::debug;
use thiserror::Error;

use crate::model::{Architecture, Instruction, InstructionClass, ProcessorFlags, TextSpan};

/// Why a line of disassembly could not be turned into an instruction.
///
/// These are per-instruction failures; a block builder truncates the block at
/// the failing instruction rather than guessing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisassemblyError {
    #[error("Disassembler could not decode the instruction at {0:#x}")]
    NotDisassemblable(u64),

    #[error("Next instruction address does not advance past {0:#x}")]
    NoProgress(u64),

    #[error("Disassembly line is missing the address, opcode or mnemonic field: '{0}'")]
    MissingField(String),

    #[error("Invalid address field '{0}'")]
    InvalidAddress(String),

    #[error("Unexpected continuation marker in '{0}'")]
    UnexpectedContinuation(String),
}

/// Parse and classify one line of disassembly.
///
/// `next_address` is where the following instruction starts, if known.
/// `flags_valid` and `flags` describe the processor flags before this
/// instruction executes; they only matter for ARM conditional execution.
pub fn disassemble(
    line: &str,
    next_address: Option<u64>,
    arch: Architecture,
    flags_valid: bool,
    flags: &ProcessorFlags,
) -> Result<Instruction, DisassemblyError> {
    // Tabs become spaces so argument scanning sees one kind of separator.
    let text = line.to_lowercase().replace('\t', " ");

    if text.contains("disassembly not possible") {
        let address = text.split_whitespace().next().and_then(fields::parse_address);
        return Err(DisassemblyError::NotDisassemblable(address.unwrap_or_default()));
    }

    let Some(parts) = fields::split_fields(&text, registers::mnemonic_prefixes(arch)) else {
        return Err(DisassemblyError::MissingField(line.trim_end().to_string()));
    };

    let address_text = &text[parts.address.clone()];
    let mut address = fields::parse_address(address_text)
        .ok_or_else(|| DisassemblyError::InvalidAddress(address_text.to_string()))?;
    if arch == Architecture::Arm {
        // Thumb addresses carry the mode in bit 0.
        address &= !1;
    }

    let mnemonic = &text[parts.mnemonic.clone()];
    if mnemonic.starts_with('?') || text[parts.opcode.clone()].starts_with('<') {
        return Err(DisassemblyError::UnexpectedContinuation(line.trim_end().to_string()));
    }
    if next_address == Some(address) {
        return Err(DisassemblyError::NoProgress(address));
    }

    let mut instruction = Instruction::from_parts(
        text,
        address,
        next_address,
        TextSpan::new(parts.address),
        TextSpan::new(parts.opcode),
        TextSpan::new(parts.mnemonic),
        TextSpan::new(parts.arguments),
    );
    instruction.flags_valid = flags_valid;
    classify(&mut instruction, arch, flags);
    Ok(instruction)
}

/// Classify an already-tokenized instruction in place.
///
/// Resets any previous classification first, so classifying twice yields the
/// same result. Unmatched mnemonics stay `Unknown` with empty operand sets.
pub fn classify(instruction: &mut Instruction, arch: Architecture, flags: &ProcessorFlags) {
    instruction.reset_classification();

    if let Some(info) = tables::lookup(arch, instruction.root_mnemonic()) {
        instruction.class = info.class;
        match arch {
            Architecture::X86 | Architecture::X64 => {
                scanner::scan_x86_operands(arch, info, instruction);
            }
            Architecture::Arm => scanner::scan_arm_operands(info, instruction),
        }
        for hook in info.overrides {
            hook.apply(instruction);
        }
        instruction.unconditional_class = instruction.class;
        if arch == Architecture::Arm {
            let flags_valid = instruction.flags_valid;
            condition::resolve_conditional_execution(
                instruction,
                info.mnemonic.len(),
                flags_valid,
                flags,
            );
        }
    }

    instruction.flags_modified = modifies_flags(instruction);
    debug!(
        "{} => {} src={} dst={} dst_ptr={}",
        instruction.text(),
        instruction.class,
        instruction.source,
        instruction.destination,
        instruction.destination_pointer
    );
}

/// Unknown instructions are assumed to clobber the flags; no-ops never do.
fn modifies_flags(instruction: &Instruction) -> bool {
    match instruction.class {
        InstructionClass::Noop => false,
        InstructionClass::Unknown => true,
        _ => instruction.destination.contains_any(registers::FLAG_OPERANDS),
    }
}
