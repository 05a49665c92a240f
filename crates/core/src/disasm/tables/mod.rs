//! Static instruction classification tables.
//!
//! One ordered table per architecture. Lookup is first-match-wins: an entry
//! matches when its mnemonic is a prefix of the instruction's root mnemonic
//! (or equals it, for exact entries). More specific entries must therefore
//! come before the general prefixes that would otherwise swallow them, e.g.
//! `movsb` before `mov`, and `bl`/`bx`/`bic` before `b`. `bl` is exact plus
//! condition codes, since `blt` and `bls` are `b` with a condition.

mod arm;
mod x64;
mod x86;

use bitflags::bitflags;

use super::condition::Condition;
use super::overrides::Override;
use crate::model::{Architecture, InstructionClass};

bitflags! {
    /// Describes where the operands named in the argument text go.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OperandShape: u8 {
        /// Plain registers may be sources.
        const SOURCE_REGISTER = 1 << 0;
        /// Memory references may be sources.
        const SOURCE_POINTER = 1 << 1;
        /// Plain registers may be destinations.
        const DESTINATION_REGISTER = 1 << 2;
        /// Memory references may be destinations.
        const DESTINATION_POINTER = 1 << 3;
        /// The destination is read as well as written (`add eax, ebx`).
        const DESTINATION_IS_IMPLIED_SOURCE = 1 << 4;
        /// The destination is only read (`cmp`, `test`).
        const DESTINATION_IS_UNAFFECTED = 1 << 5;
        /// Sources come first in the argument text.
        const OPERAND_ORDER_REVERSED = 1 << 6;
        /// The first two operands share the initial mode (`ldrd r0, r1, [r2]`).
        const DUAL_INITIAL_OPERANDS = 1 << 7;

        const SOURCE_OPERANDS = Self::SOURCE_REGISTER.bits() | Self::SOURCE_POINTER.bits();
        const DESTINATION_OPERANDS =
            Self::DESTINATION_REGISTER.bits() | Self::DESTINATION_POINTER.bits();
        const ALL_OPERANDS = Self::SOURCE_OPERANDS.bits() | Self::DESTINATION_OPERANDS.bits();
    }
}

impl OperandShape {
    pub const NONE: OperandShape = OperandShape::empty();

    pub fn has_source(self) -> bool {
        self.intersects(OperandShape::SOURCE_OPERANDS)
    }

    pub fn has_destination(self) -> bool {
        self.intersects(OperandShape::DESTINATION_OPERANDS)
    }
}

/// One classification table row.
#[derive(Debug, Clone, Copy)]
pub struct InstructionInfo {
    pub mnemonic: &'static str,
    pub exact: bool,
    /// Exact rows only: also match the mnemonic followed by a condition code
    /// (`blne`), so it is not mistaken for a prefix row plus garbage.
    pub conditional: bool,
    pub class: InstructionClass,
    pub shape: OperandShape,
    pub overrides: &'static [Override],
    pub implicit_source: &'static [&'static str],
    pub implicit_destination: &'static [&'static str],
    pub implicit_destination_pointer: &'static [&'static str],
    pub implicit_passed_or_returned: &'static [&'static str],
}

impl InstructionInfo {
    /// Entry matching any mnemonic that starts with `mnemonic`.
    pub const fn prefix(
        mnemonic: &'static str,
        class: InstructionClass,
        shape: OperandShape,
    ) -> Self {
        Self {
            mnemonic,
            exact: false,
            conditional: false,
            class,
            shape,
            overrides: &[],
            implicit_source: &[],
            implicit_destination: &[],
            implicit_destination_pointer: &[],
            implicit_passed_or_returned: &[],
        }
    }

    /// Entry matching only `mnemonic` itself.
    pub const fn exact(
        mnemonic: &'static str,
        class: InstructionClass,
        shape: OperandShape,
    ) -> Self {
        let mut info = Self::prefix(mnemonic, class, shape);
        info.exact = true;
        info
    }

    /// Also match the mnemonic with an ARM condition code appended.
    pub const fn conditional(mut self) -> Self {
        self.conditional = true;
        self
    }

    pub const fn overrides(mut self, overrides: &'static [Override]) -> Self {
        self.overrides = overrides;
        self
    }

    pub const fn reads(mut self, registers: &'static [&'static str]) -> Self {
        self.implicit_source = registers;
        self
    }

    pub const fn writes(mut self, registers: &'static [&'static str]) -> Self {
        self.implicit_destination = registers;
        self
    }

    pub const fn writes_through(mut self, registers: &'static [&'static str]) -> Self {
        self.implicit_destination_pointer = registers;
        self
    }

    pub const fn passes(mut self, registers: &'static [&'static str]) -> Self {
        self.implicit_passed_or_returned = registers;
        self
    }

    /// Whether this row applies to `mnemonic`.
    pub fn matches(&self, mnemonic: &str) -> bool {
        if self.exact {
            mnemonic == self.mnemonic
                || (self.conditional
                    && mnemonic
                        .strip_prefix(self.mnemonic)
                        .is_some_and(|rest| Condition::parse(rest).is_some()))
        } else {
            mnemonic.starts_with(self.mnemonic)
        }
    }
}

/// The ordered table for `arch`.
pub fn table(arch: Architecture) -> &'static [InstructionInfo] {
    match arch {
        Architecture::X86 => x86::INSTRUCTIONS,
        Architecture::X64 => x64::INSTRUCTIONS,
        Architecture::Arm => arm::INSTRUCTIONS,
    }
}

/// First table row matching `mnemonic`, if any.
pub fn lookup(arch: Architecture, mnemonic: &str) -> Option<&'static InstructionInfo> {
    table(arch).iter().find(|info| info.matches(mnemonic))
}
