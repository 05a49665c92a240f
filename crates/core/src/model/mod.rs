//! Core data model for classified instructions.
//!
//! This module contains:
//! - `Operand` / `OperandSet`: named registers, logical flags and memory
//!   expressions treated as units of dataflow.
//! - `Instruction`: one classified line of disassembly with its operand sets.
//! - `Architecture` and `ProcessorFlags`: the context classification runs in.

mod instruction;
mod operand;

pub use instruction::{Instruction, InstructionClass, TextSpan};
pub use operand::{Operand, OperandSet};

use std::fmt;
use std::str::FromStr;

/// Instruction set a block of disassembly belongs to.
///
/// ARM covers both ARM and THUMB encodings; the disassembly text is the same
/// shape for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    #[default]
    X86,
    X64,
    Arm,
}

impl Architecture {
    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
            Architecture::Arm => "arm",
        }
    }

    /// Whether explicit memory operands are legal on push/pop.
    pub fn allows_memory_stack_operands(self) -> bool {
        matches!(self, Architecture::X86 | Architecture::X64)
    }

    /// Whether a single push/pop may name several registers.
    pub fn allows_multiple_stack_operands(self) -> bool {
        matches!(self, Architecture::Arm)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86" | "i386" => Ok(Architecture::X86),
            "x64" | "amd64" | "x86_64" => Ok(Architecture::X64),
            "arm" | "thumb" | "armv7" => Ok(Architecture::Arm),
            other => Err(format!("unknown architecture '{other}'")),
        }
    }
}

/// Snapshot of the processor flags at the start of a block.
///
/// `valid` is false when the host could not supply the flags register, in
/// which case the individual bits carry no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProcessorFlags {
    pub valid: bool,
    pub zero: bool,
    pub carry: bool,
    pub overflow: bool,
    pub sign: bool,
    pub parity: bool,
    pub aux: bool,
}

impl ProcessorFlags {
    /// A snapshot the host could not provide.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// A valid snapshot with every flag clear.
    pub fn known() -> Self {
        Self { valid: true, ..Self::default() }
    }
}
