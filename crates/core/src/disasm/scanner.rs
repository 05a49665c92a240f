//! Operand scanners.
//!
//! Each scanner walks the argument text of one instruction token by token and
//! files the registers it finds into the instruction's operand sets, guided by
//! the table row's `OperandShape`. Both scanners share three rules:
//!
//! - a top-level comma switches between the source and destination side;
//! - `[...]` marks an indirect (memory) reference;
//! - a pointer-relative expression such as `[ebp-8]` is captured as one
//!   compound operand so a stack slot can be tracked like a register.
//!
//! The ARM scanner additionally understands `{...}` register lists and ranges
//! such as `{r4-r7}`.

use std::ops::Range;

use log::trace;

use super::registers::{self, ARM_RANGE_BOUND, ARM_REGISTERS};
use super::tables::{InstructionInfo, OperandShape};
use crate::model::{Architecture, Instruction, Operand, OperandSet};

const X86_DELIMITERS: &[u8] = b"[], :+-*";
const X86_COMPOUND_MARKERS: &[char] = &[',', ' ', ':', '+', '-', '*'];
const ARM_DELIMITERS: &[u8] = b"{}[], -+#!";
const ARM_COMPOUND_MARKERS: &[char] = &[',', ' ', '#', '+', '-'];

/// One step of the tokenizer: the text before the next delimiter, the
/// delimiter itself (`None` at end of input) and where scanning resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    span: Range<usize>,
    delimiter: Option<u8>,
    next: usize,
}

fn next_token(text: &str, start: usize, delimiters: &[u8]) -> Option<Token> {
    let bytes = text.as_bytes();
    if start >= bytes.len() {
        return None;
    }
    match bytes[start..].iter().position(|b| delimiters.contains(b)) {
        Some(offset) => {
            let end = start + offset;
            Some(Token { span: start..end, delimiter: Some(bytes[end]), next: end + 1 })
        }
        None => Some(Token { span: start..bytes.len(), delimiter: None, next: bytes.len() }),
    }
}

/// Add the table row's implicit operands to `instruction`.
fn add_implicit_operands(info: &InstructionInfo, instruction: &mut Instruction) {
    instruction.source.extend(info.implicit_source.iter().copied());
    instruction.destination.extend(info.implicit_destination.iter().copied());
    instruction.destination_pointer.extend(info.implicit_destination_pointer.iter().copied());
    instruction.passed_or_returned.extend(info.implicit_passed_or_returned.iter().copied());
}

/// Which side a top-level comma switches to.
fn side_after_comma(shape: OperandShape) -> bool {
    if shape.contains(OperandShape::OPERAND_ORDER_REVERSED) {
        !shape.has_destination()
    } else {
        shape.has_source()
    }
}

fn initial_side(shape: OperandShape) -> bool {
    !shape.has_destination() || shape.contains(OperandShape::OPERAND_ORDER_REVERSED)
}

/// Where a captured `[base-offset]` expression goes.
fn place_compound(
    instruction: &mut Instruction,
    shape: OperandShape,
    text: &str,
    was_in_source: bool,
    markers: &[char],
) {
    let operand = Operand::new(text);
    if was_in_source {
        instruction.source.insert(operand.clone());
    } else {
        if !shape.contains(OperandShape::DESTINATION_IS_UNAFFECTED) {
            instruction.destination.insert(operand.clone());
        }
        if shape.contains(OperandShape::DESTINATION_IS_IMPLIED_SOURCE) {
            instruction.source.insert(operand.clone());
        }
    }
    instruction.explicit.insert(operand.clone());
    if text.contains(markers) {
        instruction.compound.insert(operand);
    }
}

/// Which sets an individual register lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Source,
    Destination,
    DestinationPointer,
}

fn targets(shape: OperandShape, was_in_source: bool, was_indirect: bool) -> Vec<Target> {
    if was_in_source {
        return vec![Target::Source];
    }
    let mut out = Vec::with_capacity(2);
    if !shape.contains(OperandShape::DESTINATION_IS_UNAFFECTED) {
        if was_indirect || !shape.contains(OperandShape::DESTINATION_REGISTER) {
            out.push(Target::DestinationPointer);
        } else {
            out.push(Target::Destination);
        }
    }
    if shape.contains(OperandShape::DESTINATION_IS_IMPLIED_SOURCE) {
        out.push(Target::Source);
    }
    out
}

fn set_for(instruction: &mut Instruction, target: Target) -> &mut OperandSet {
    match target {
        Target::Source => &mut instruction.source,
        Target::Destination => &mut instruction.destination,
        Target::DestinationPointer => &mut instruction.destination_pointer,
    }
}

/// Scan x86/x64 argument text.
pub fn scan_x86_operands(
    arch: Architecture,
    info: &InstructionInfo,
    instruction: &mut Instruction,
) {
    add_implicit_operands(info, instruction);
    let shape = info.shape;
    if shape.is_empty() {
        return;
    }

    let args = instruction.arguments().to_owned();
    let excluded = registers::excluded_operands(arch);
    let mut in_source = initial_side(shape);
    let mut in_indirect = false;
    let mut monitored: Option<usize> = None;
    let mut pos = 0;

    while let Some(token) = next_token(&args, pos, X86_DELIMITERS) {
        pos = token.next;
        let was_in_source = in_source;
        let was_indirect = in_indirect;

        match token.delimiter {
            Some(b',') => in_source = side_after_comma(shape),
            Some(b'[') => in_indirect = true,
            Some(b']') => {
                in_indirect = false;
                if let Some(start) = monitored.take() {
                    let text = &args[start..token.span.end];
                    place_compound(instruction, shape, text, was_in_source, X86_COMPOUND_MARKERS);
                    continue;
                }
            }
            Some(b':') => continue,
            _ => {}
        }

        let name = &args[token.span.clone()];
        if name.is_empty() {
            continue;
        }
        if excluded.contains(&name) {
            monitored = None;
            continue;
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        if name.starts_with('(') {
            monitored = None;
            continue;
        }
        if !registers::is_register(arch, name) {
            trace!("skipping non-register token '{name}'");
            continue;
        }

        // Frame and stack pointer offsets (`[ebp-8]`, `[esp+4]`) become one
        // logical operand, closed at the matching `]`.
        if in_indirect
            && name.ends_with('p')
            && monitored.is_none()
            && matches!(token.delimiter, Some(b'+') | Some(b'-'))
        {
            monitored = Some(token.span.start);
        } else {
            monitored = None;
        }

        for target in targets(shape, was_in_source, was_indirect) {
            set_for(instruction, target).insert(Operand::new(name));
        }
        instruction.explicit.insert(Operand::new(name));
    }
}

/// Registers strictly after `first` up to and including `last`, walking the
/// canonical core-register order.
///
/// A range written backwards (`r7-r4`) runs to the end of the core registers
/// rather than wrapping.
pub fn register_range(first: &str, last: &str) -> Vec<&'static str> {
    if first.len() <= 1 || last.len() <= 1 {
        return Vec::new();
    }
    let core = &ARM_REGISTERS[..ARM_RANGE_BOUND];
    let Some(start) = core.iter().position(|reg| *reg == first) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for reg in &core[start + 1..] {
        out.push(*reg);
        if *reg == last {
            break;
        }
    }
    out
}

/// Scan ARM/THUMB argument text.
pub fn scan_arm_operands(info: &InstructionInfo, instruction: &mut Instruction) {
    add_implicit_operands(info, instruction);
    let shape = info.shape;
    if shape.is_empty() {
        return;
    }

    let args = instruction.arguments().to_owned();
    let initial_operands = if shape.contains(OperandShape::DUAL_INITIAL_OPERANDS) { 2 } else { 1 };
    let mut operands_found = 0;
    let mut in_source = initial_side(shape);
    let mut in_indirect = false;
    let mut in_list = false;
    let mut monitored: Option<usize> = None;
    let mut range_start: Option<Range<usize>> = None;
    let mut pos = 0;

    while let Some(token) = next_token(&args, pos, ARM_DELIMITERS) {
        pos = token.next;
        let was_in_source = in_source;
        let was_indirect = in_indirect;
        let pending_range = range_start.clone();

        match token.delimiter {
            Some(b',') => {
                if !in_list {
                    operands_found += 1;
                    if operands_found == initial_operands {
                        in_source = side_after_comma(shape);
                    }
                }
            }
            Some(b'{') => in_list = true,
            Some(b'}') => in_list = false,
            Some(b'[') => in_indirect = true,
            Some(b']') => {
                in_indirect = false;
                if let Some(start) = monitored.take() {
                    let text = &args[start..token.span.end];
                    place_compound(instruction, shape, text, was_in_source, ARM_COMPOUND_MARKERS);
                    continue;
                }
            }
            Some(b'-') => {
                if in_list {
                    range_start = Some(token.span.clone());
                } else {
                    continue;
                }
            }
            _ => {}
        }

        let name = &args[token.span.clone()];
        if name.is_empty() {
            continue;
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        if name.starts_with('(') {
            monitored = None;
            continue;
        }
        if !registers::is_register(Architecture::Arm, name) {
            trace!("skipping non-register token '{name}'");
            continue;
        }

        // Any register opening an indirect reference is tracked.
        if in_indirect && monitored.is_none() {
            monitored = Some(token.span.start);
        }

        let names: Vec<String> = match &pending_range {
            Some(first) => register_range(&args[first.clone()], name)
                .into_iter()
                .map(str::to_owned)
                .collect(),
            None => vec![name.to_owned()],
        };

        for target in targets(shape, was_in_source, was_indirect) {
            set_for(instruction, target).extend(names.iter().cloned());
        }
        instruction.explicit.extend(names);

        if pending_range.is_some() {
            range_start = None;
        }
    }
}
