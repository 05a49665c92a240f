//! Post-classification adjustments.
//!
//! Table rows list overrides to run, in order, once operands have been
//! extracted. Each one inspects the classified instruction and may rewrite its
//! class or operand sets in place.

use log::trace;

use super::registers::{
    ARM_LINK_REGISTER, ARM_PROGRAM_COUNTER, ARM_RETURN_REGISTERS, STACK_CONTENTS,
};
use crate::model::{Instruction, InstructionClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    /// `xor eax, eax`: the result does not depend on the inputs. Only fires
    /// when the same register is combined with itself.
    ReflexiveCancellation,
    /// `bx lr`: a branch through the link register is a return.
    ImplicitReturn,
    /// A load or pop into the program counter is a branch.
    ImplicitBranch,
    /// A load/store with base writeback (`!`) is a block move.
    BlockMove,
}

impl Override {
    pub fn apply(self, instruction: &mut Instruction) {
        let before = instruction.class;
        match self {
            Override::ReflexiveCancellation => reflexive_cancellation(instruction),
            Override::ImplicitReturn => implicit_return(instruction),
            Override::ImplicitBranch => implicit_branch(instruction),
            Override::BlockMove => block_move(instruction),
        }
        if before != instruction.class {
            trace!("{self:?}: {before} -> {}", instruction.class);
        }
    }
}

fn reflexive_cancellation(instruction: &mut Instruction) {
    if reads_one_register_twice(instruction) {
        instruction.source.clear();
    }
}

/// `xor eax,eax` or `sub r0,r1,r1`: the operands combined are the same plain
/// register, so the result is a constant. Immediates and memory references
/// never qualify.
fn reads_one_register_twice(instruction: &Instruction) -> bool {
    let operands: Vec<&str> = instruction.arguments().split(',').map(str::trim).collect();
    let combined = match operands.as_slice() {
        [first, second] => [*first, *second],
        [_, first, second] => [*first, *second],
        _ => return false,
    };
    combined[0] == combined[1] && instruction.explicit.contains(combined[0])
}

fn implicit_return(instruction: &mut Instruction) {
    if instruction.class == InstructionClass::Branch
        && instruction.source.contains(ARM_LINK_REGISTER)
    {
        instruction.class = InstructionClass::Return;
        instruction.passed_or_returned.extend(ARM_RETURN_REGISTERS.iter().copied());
    }
}

fn implicit_branch(instruction: &mut Instruction) {
    if !instruction.destination.contains(ARM_PROGRAM_COUNTER) {
        return;
    }
    match instruction.class {
        InstructionClass::DataMove => instruction.class = InstructionClass::Branch,
        InstructionClass::StackPop => {
            instruction.class = InstructionClass::Branch;
            instruction.source.insert(STACK_CONTENTS);
        }
        _ => {}
    }
}

fn block_move(instruction: &mut Instruction) {
    if instruction.class == InstructionClass::DataMove && instruction.arguments().contains('!') {
        instruction.class = InstructionClass::BlockDataMove;
    }
}
