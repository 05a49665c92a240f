//! Forward taint propagation over one basic block.
//!
//! The first instruction of the block is the faulting one; its inputs are the
//! initial taint. Each following instruction either carries that taint into
//! its destinations or proves them clean. Two sets are carried between
//! instructions: `taint` (known tainted) and `clear` (known untainted). A
//! virtual stack tracks which pushed slots hold tainted values.
//!
//! Results are written into each instruction's `tainted_input` set. The block
//! as a whole gets a [`TaintStatus`].

pub mod stack;

pub use stack::VirtualStack;

use log::{debug, warn};

use crate::disasm::registers::{self, AliasMode, STACK_CONTENTS};
use crate::disasm::tables;
use crate::model::{Architecture, Instruction, InstructionClass, Operand, OperandSet};

/// How a taint pass over a block ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaintStatus {
    /// Every instruction was processed.
    Completed,
    /// Nothing was tainted any more from instruction `at` onwards.
    TaintExhausted { at: usize },
    /// Instruction `at` uses a stack operand shape this architecture does not
    /// support; the block cannot be analyzed past it.
    UnsupportedStackShape { at: usize },
}

impl TaintStatus {
    pub fn succeeded(self) -> bool {
        !matches!(self, TaintStatus::UnsupportedStackShape { .. })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaintStatus::Completed => "completed",
            TaintStatus::TaintExhausted { .. } => "taint_exhausted",
            TaintStatus::UnsupportedStackShape { .. } => "unsupported_stack_shape",
        }
    }
}

/// Final state of a taint pass.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TaintOutcome {
    pub status: TaintStatus,
    pub taint: OperandSet,
    pub clear: OperandSet,
    pub stack: VirtualStack,
}

impl TaintOutcome {
    pub fn succeeded(&self) -> bool {
        self.status.succeeded()
    }
}

/// Running state of one pass.
#[derive(Debug, Default)]
struct Propagation {
    taint: OperandSet,
    clear: OperandSet,
    stack: VirtualStack,
}

impl Propagation {
    fn finish(self, status: TaintStatus) -> TaintOutcome {
        TaintOutcome { status, taint: self.taint, clear: self.clear, stack: self.stack }
    }

    fn exhausted(&self) -> bool {
        self.taint.is_empty() && !self.stack.has_tainted_elements()
    }

    /// Taint for the current instruction: every alias of a tainted register
    /// that is not known to be clear, plus the stack sentinel.
    fn expanded(&self, arch: Architecture) -> OperandSet {
        let mut expanded = OperandSet::new();
        for operand in &self.taint {
            match registers::register_aliases(arch, operand.as_str(), AliasMode::MarkTainted) {
                Some(aliases) => {
                    for alias in aliases {
                        if !self.clear.contains(alias) {
                            expanded.insert(alias);
                        }
                    }
                }
                None => {
                    if !self.clear.contains_operand(operand) {
                        expanded.insert(operand.clone());
                    }
                }
            }
        }
        if self.stack.has_tainted_elements() {
            expanded.insert(STACK_CONTENTS);
        }
        expanded
    }

    /// Move `operand` into the taint or clear set.
    fn assign(&mut self, arch: Architecture, operand: &Operand, tainted: bool) {
        if tainted {
            mark(arch, operand, &mut self.taint, &mut self.clear);
        } else {
            mark(arch, operand, &mut self.clear, &mut self.taint);
        }
    }

    fn pop_into(&mut self, arch: Architecture, operand: &Operand) {
        let tainted = self.stack.pop();
        self.assign(arch, operand, tainted);
    }
}

/// Insert `operand` into `add` and drop everything a write to it overwrites
/// from `remove`.
fn mark(arch: Architecture, operand: &Operand, add: &mut OperandSet, remove: &mut OperandSet) {
    add.insert(operand.clone());
    match registers::register_aliases(arch, operand.as_str(), AliasMode::ClearTainted) {
        Some(aliases) => {
            for alias in aliases {
                remove.remove(alias);
            }
        }
        None => {
            remove.remove(operand.as_str());
        }
    }
}

fn implicit_operands(
    arch: Architecture,
    instruction: &Instruction,
    pick: fn(&tables::InstructionInfo) -> &'static [&'static str],
) -> Vec<Operand> {
    tables::lookup(arch, instruction.root_mnemonic())
        .map(|info| pick(info).iter().map(|name| Operand::fixed(*name)).collect())
        .unwrap_or_default()
}

/// Propagate taint through `block`, starting from its first instruction.
///
/// The first instruction's source registers are the initial taint; with
/// `taint_destination_pointers` its destination-pointer registers are too.
/// Each instruction's `tainted_input` receives the inputs that carried taint
/// into it.
pub fn assign_taint(
    arch: Architecture,
    taint_destination_pointers: bool,
    block: &mut [Instruction],
) -> TaintOutcome {
    let mut state = Propagation::default();

    if let Some(first) = block.first() {
        state.taint = first.source.clone();
        if taint_destination_pointers {
            state.taint.extend(first.destination_pointer.iter().cloned());
        }
        debug!("taint seeded with {}", state.taint);
    }

    for (index, instruction) in block.iter_mut().enumerate() {
        if state.exhausted() {
            debug!("taint exhausted at instruction {index}");
            return state.finish(TaintStatus::TaintExhausted { at: index });
        }
        if instruction.class == InstructionClass::Noop {
            continue;
        }

        let expanded = state.expanded(arch);
        record_tainted_inputs(instruction, &expanded);

        if !transition(arch, instruction, &expanded, &mut state) {
            warn!(
                "unsupported stack operand shape at instruction {index}: {}",
                instruction.text()
            );
            return state.finish(TaintStatus::UnsupportedStackShape { at: index });
        }
        debug!("after {}: taint={} clear={}", instruction.text(), state.taint, state.clear);
    }

    state.finish(TaintStatus::Completed)
}

fn record_tainted_inputs(instruction: &mut Instruction, expanded: &OperandSet) {
    let inputs = instruction
        .source
        .iter()
        .chain(&instruction.destination_pointer)
        .chain(&instruction.passed_or_returned)
        .filter(|operand| expanded.contains_operand(operand))
        .cloned()
        .collect::<Vec<_>>();
    instruction.tainted_input.extend(inputs);
}

/// Update `state` for the effect of one executed instruction. Returns `false`
/// when the instruction's stack shape cannot be modelled.
fn transition(
    arch: Architecture,
    instruction: &mut Instruction,
    expanded: &OperandSet,
    state: &mut Propagation,
) -> bool {
    match instruction.class {
        InstructionClass::StackPop => pop(arch, instruction, state),
        InstructionClass::StackPush => push(arch, instruction, expanded, state),
        InstructionClass::DataExchange => {
            let source_tainted = instruction.source.intersects(expanded);
            let destination_tainted = instruction.destination.intersects(expanded);
            for operand in &instruction.source {
                state.assign(arch, operand, destination_tainted);
            }
            for operand in &instruction.destination {
                state.assign(arch, operand, source_tainted);
            }
            true
        }
        InstructionClass::UnpredictableConditionalExecution => {
            // It may not have executed, so it can only ever add taint.
            if instruction.source.intersects(expanded) {
                for operand in &instruction.destination {
                    state.assign(arch, operand, true);
                }
            }
            true
        }
        _ => {
            let tainted = instruction.source.intersects(expanded);
            for operand in &instruction.destination {
                state.assign(arch, operand, tainted);
            }
            true
        }
    }
}

fn pop(arch: Architecture, instruction: &mut Instruction, state: &mut Propagation) -> bool {
    let implicit = implicit_operands(arch, instruction, |info| info.implicit_destination);
    if instruction.explicit.is_empty() && !implicit.is_empty() {
        for operand in &implicit {
            state.pop_into(arch, operand);
        }
        return true;
    }

    if instruction.destination.len() == 1 {
        if let Some(operand) = instruction.destination.iter().next().cloned() {
            state.pop_into(arch, &operand);
        }
        return true;
    }

    if !instruction.destination_pointer.is_empty() {
        if !arch.allows_memory_stack_operands() {
            return false;
        }
        // The popped value lands in memory; carry its taint as a stack input.
        if state.stack.pop() {
            instruction.source.insert(STACK_CONTENTS);
            instruction.tainted_input.insert(STACK_CONTENTS);
        }
        return true;
    }

    if instruction.destination.is_empty() {
        state.stack.pop();
        return true;
    }

    if !arch.allows_multiple_stack_operands() {
        return false;
    }
    match registers::operands_in_pop_order(arch, &instruction.destination) {
        Some(ordered) => {
            for operand in &ordered {
                state.pop_into(arch, operand);
            }
            true
        }
        None => false,
    }
}

fn push(
    arch: Architecture,
    instruction: &Instruction,
    expanded: &OperandSet,
    state: &mut Propagation,
) -> bool {
    let implicit = implicit_operands(arch, instruction, |info| info.implicit_source);
    if instruction.explicit.is_empty() && !implicit.is_empty() {
        for operand in &implicit {
            state.stack.push(operand, expanded);
        }
        return true;
    }

    match instruction.source.len() {
        0 => state.stack.push_constant(),
        1 => {
            if let Some(operand) = instruction.source.iter().next() {
                state.stack.push(operand, expanded);
            }
        }
        _ if arch.allows_memory_stack_operands() => {
            // A push from a computed address is tainted if any part of the
            // address is.
            state.stack.push_any(&instruction.source, expanded);
        }
        _ if arch.allows_multiple_stack_operands() => {
            let Some(ordered) = registers::operands_in_push_order(arch, &instruction.source)
            else {
                return false;
            };
            for operand in &ordered {
                state.stack.push(operand, expanded);
            }
        }
        _ => return false,
    }
    true
}
