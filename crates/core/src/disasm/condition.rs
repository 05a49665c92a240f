//! ARM conditional execution.
//!
//! ARM mnemonics carry optional suffixes after the table root: `s` to set the
//! flags, then a two-letter condition code. A conditional instruction reads
//! the flags its condition tests; whether it runs at all depends on the flags
//! snapshot at that point in the block.

use log::debug;

use super::registers::{CARRY_FLAG, FLAGS, OVERFLOW_FLAG, SIGN_FLAG, ZERO_FLAG};
use crate::model::{Instruction, InstructionClass, ProcessorFlags};

/// ARM condition codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Cs,
    Cc,
    Mi,
    Pl,
    Vs,
    Vc,
    Hi,
    Ls,
    Ge,
    Lt,
    Gt,
    Le,
    Al,
}

impl Condition {
    pub fn parse(code: &str) -> Option<Self> {
        let condition = match code {
            "eq" => Condition::Eq,
            "ne" => Condition::Ne,
            "cs" | "hs" => Condition::Cs,
            "cc" | "lo" => Condition::Cc,
            "mi" => Condition::Mi,
            "pl" => Condition::Pl,
            "vs" => Condition::Vs,
            "vc" => Condition::Vc,
            "hi" => Condition::Hi,
            "ls" => Condition::Ls,
            "ge" => Condition::Ge,
            "lt" => Condition::Lt,
            "gt" => Condition::Gt,
            "le" => Condition::Le,
            "al" => Condition::Al,
            _ => return None,
        };
        Some(condition)
    }

    /// Logical flag operands the condition reads.
    pub fn flags_read(self) -> &'static [&'static str] {
        match self {
            Condition::Eq | Condition::Ne => &[ZERO_FLAG],
            Condition::Cs | Condition::Cc => &[CARRY_FLAG],
            Condition::Mi | Condition::Pl => &[SIGN_FLAG],
            Condition::Vs | Condition::Vc => &[OVERFLOW_FLAG],
            Condition::Hi | Condition::Ls => &[CARRY_FLAG, ZERO_FLAG],
            Condition::Ge | Condition::Lt => &[SIGN_FLAG, OVERFLOW_FLAG],
            Condition::Gt | Condition::Le => &[ZERO_FLAG, SIGN_FLAG, OVERFLOW_FLAG],
            Condition::Al => &[],
        }
    }

    /// Whether the instruction executes under `flags`.
    pub fn holds(self, flags: &ProcessorFlags) -> bool {
        let ProcessorFlags { zero: z, carry: c, overflow: v, sign: n, .. } = *flags;
        match self {
            Condition::Eq => z,
            Condition::Ne => !z,
            Condition::Cs => c,
            Condition::Cc => !c,
            Condition::Mi => n,
            Condition::Pl => !n,
            Condition::Vs => v,
            Condition::Vc => !v,
            Condition::Hi => c && !z,
            Condition::Ls => !c || z,
            Condition::Ge => n == v,
            Condition::Lt => n != v,
            Condition::Gt => !z && n == v,
            Condition::Le => z || n != v,
            Condition::Al => true,
        }
    }
}

/// Suffixes found after the table root of an ARM mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MnemonicSuffix {
    pub sets_flags: bool,
    pub condition: Option<Condition>,
}

/// Split the suffixes off `mnemonic`, whose first `root_len` bytes matched a
/// table row.
pub fn parse_suffix(mnemonic: &str, root_len: usize) -> MnemonicSuffix {
    let mut suffix = MnemonicSuffix::default();
    let Some(mut rest) = mnemonic.get(root_len..) else {
        return suffix;
    };
    if mnemonic.len() <= 1 || rest.is_empty() {
        return suffix;
    }

    if let Some(after) = rest.strip_prefix('s') {
        suffix.sets_flags = true;
        rest = after;
    }
    suffix.condition = rest.get(..2).and_then(Condition::parse);
    suffix
}

/// Apply flag-setting and condition-code suffixes to a classified ARM
/// instruction.
///
/// `flags_valid` and `flags` describe the processor flags at this point in
/// the block.
pub fn resolve_conditional_execution(
    instruction: &mut Instruction,
    root_len: usize,
    flags_valid: bool,
    flags: &ProcessorFlags,
) {
    let suffix = parse_suffix(instruction.root_mnemonic(), root_len);

    if suffix.sets_flags {
        instruction.source.insert(FLAGS);
        instruction.destination.insert(FLAGS);
    }

    let Some(condition) = suffix.condition else {
        return;
    };
    instruction.source.extend(condition.flags_read().iter().copied());
    if condition == Condition::Al {
        return;
    }

    if !flags_valid {
        debug!("{}: condition {condition:?} with unknown flags", instruction.mnemonic());
        instruction.class = InstructionClass::UnpredictableConditionalExecution;
    } else if !condition.holds(flags) {
        debug!("{}: condition {condition:?} not met, not executed", instruction.mnemonic());
        instruction.class = InstructionClass::Noop;
    }
}
