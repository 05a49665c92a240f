//! Register catalogue per architecture.
//!
//! Register names recognized by the operand scanners, the keywords they skip,
//! the mnemonic prefixes the field tokenizer keeps attached, and the alias
//! tables used by taint propagation.
//!
//! Aliases are derived from register families. Each family lists the views of
//! one physical register with the bit range each view covers, so "which names
//! overlap `al`" and "which names does a write to `eax` overwrite" are simple
//! range checks instead of hand-maintained lists.

use crate::model::{Architecture, Operand, OperandSet};

pub const STACK_CONTENTS: &str = "StackContents";
pub const ZERO_FLAG: &str = "ZeroFlag";
pub const CARRY_FLAG: &str = "CarryFlag";
pub const OVERFLOW_FLAG: &str = "OverflowFlag";
pub const PARITY_FLAG: &str = "ParityFlag";
pub const SIGN_FLAG: &str = "SignFlag";
pub const AUX_FLAG: &str = "AuxFlag";
pub const FLAGS: &str = "Flags";

/// Logical operands that carry processor flag state.
pub const FLAG_OPERANDS: &[&str] =
    &[ZERO_FLAG, CARRY_FLAG, OVERFLOW_FLAG, PARITY_FLAG, SIGN_FLAG, AUX_FLAG, FLAGS];

/// Which way an alias lookup is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasMode {
    /// Names that become suspect when the register is tainted.
    MarkTainted,
    /// Names overwritten (and therefore cleared) when the register is written.
    ClearTainted,
}

#[derive(Debug, Clone, Copy)]
struct View {
    name: &'static str,
    lo: u8,
    hi: u8,
}

const fn v(name: &'static str, lo: u8, hi: u8) -> View {
    View { name, lo, hi }
}

type Family = &'static [View];

const X86_FLAGS: Family = &[
    v(FLAGS, 0, 32),
    v(CARRY_FLAG, 0, 1),
    v(PARITY_FLAG, 2, 3),
    v(AUX_FLAG, 4, 5),
    v(ZERO_FLAG, 6, 7),
    v(SIGN_FLAG, 7, 8),
    v(OVERFLOW_FLAG, 11, 12),
];

const ARM_FLAGS: Family = &[
    v(FLAGS, 0, 32),
    v(OVERFLOW_FLAG, 28, 29),
    v(CARRY_FLAG, 29, 30),
    v(ZERO_FLAG, 30, 31),
    v(SIGN_FLAG, 31, 32),
];

static X86_FAMILIES: &[Family] = &[
    &[v("eax", 0, 32), v("ax", 0, 16), v("al", 0, 8), v("ah", 8, 16)],
    &[v("ebx", 0, 32), v("bx", 0, 16), v("bl", 0, 8), v("bh", 8, 16)],
    &[v("ecx", 0, 32), v("cx", 0, 16), v("cl", 0, 8), v("ch", 8, 16)],
    &[v("edx", 0, 32), v("dx", 0, 16), v("dl", 0, 8), v("dh", 8, 16)],
    &[v("esi", 0, 32), v("si", 0, 16)],
    &[v("edi", 0, 32), v("di", 0, 16)],
    &[v("ebp", 0, 32), v("bp", 0, 16)],
    &[v("esp", 0, 32), v("sp", 0, 16)],
    &[v("eip", 0, 32), v("ip", 0, 16)],
    X86_FLAGS,
];

static X64_FAMILIES: &[Family] = &[
    &[v("rax", 0, 64), v("eax", 0, 32), v("ax", 0, 16), v("al", 0, 8), v("ah", 8, 16)],
    &[v("rbx", 0, 64), v("ebx", 0, 32), v("bx", 0, 16), v("bl", 0, 8), v("bh", 8, 16)],
    &[v("rcx", 0, 64), v("ecx", 0, 32), v("cx", 0, 16), v("cl", 0, 8), v("ch", 8, 16)],
    &[v("rdx", 0, 64), v("edx", 0, 32), v("dx", 0, 16), v("dl", 0, 8), v("dh", 8, 16)],
    &[v("rsi", 0, 64), v("esi", 0, 32), v("si", 0, 16), v("sil", 0, 8)],
    &[v("rdi", 0, 64), v("edi", 0, 32), v("di", 0, 16), v("dil", 0, 8)],
    &[v("rbp", 0, 64), v("ebp", 0, 32), v("bp", 0, 16), v("bpl", 0, 8)],
    &[v("rsp", 0, 64), v("esp", 0, 32), v("sp", 0, 16), v("spl", 0, 8)],
    &[v("rip", 0, 64), v("eip", 0, 32), v("ip", 0, 16)],
    &[v("r8", 0, 64), v("r8d", 0, 32), v("r8w", 0, 16), v("r8b", 0, 8)],
    &[v("r9", 0, 64), v("r9d", 0, 32), v("r9w", 0, 16), v("r9b", 0, 8)],
    &[v("r10", 0, 64), v("r10d", 0, 32), v("r10w", 0, 16), v("r10b", 0, 8)],
    &[v("r11", 0, 64), v("r11d", 0, 32), v("r11w", 0, 16), v("r11b", 0, 8)],
    &[v("r12", 0, 64), v("r12d", 0, 32), v("r12w", 0, 16), v("r12b", 0, 8)],
    &[v("r13", 0, 64), v("r13d", 0, 32), v("r13w", 0, 16), v("r13b", 0, 8)],
    &[v("r14", 0, 64), v("r14d", 0, 32), v("r14w", 0, 16), v("r14b", 0, 8)],
    &[v("r15", 0, 64), v("r15d", 0, 32), v("r15w", 0, 16), v("r15b", 0, 8)],
    X86_FLAGS,
];

static ARM_FAMILIES: &[Family] = &[ARM_FLAGS];

const SEGMENT_REGISTERS: &[&str] = &["cs", "ds", "es", "fs", "gs", "ss"];

/// ARM registers in canonical order. The first 16 entries are the core
/// registers that range expressions such as `r4-r7` walk.
pub const ARM_REGISTERS: &[&str] = &[
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "sp", "lr",
    "pc", "fp", "ip", "sb", "sl",
];

/// Number of leading `ARM_REGISTERS` entries a register range may cover.
pub const ARM_RANGE_BOUND: usize = 16;

/// Order a multi-register push stores its registers in, first pushed first.
pub const ARM_PUSH_ORDER: &[&str] = &[
    "pc", "lr", "sp", "r12", "ip", "r11", "fp", "r10", "sl", "r9", "sb", "r8", "r7", "r6", "r5",
    "r4", "r3", "r2", "r1", "r0",
];

/// Order a multi-register pop loads its registers in, first popped first.
pub const ARM_POP_ORDER: &[&str] = &[
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "sb", "r9", "sl", "r10", "fp", "r11",
    "ip", "r12", "sp", "lr", "pc",
];

pub const ARM_LINK_REGISTER: &str = "lr";
pub const ARM_PROGRAM_COUNTER: &str = "pc";

/// Registers an ARM function returns its result in.
pub const ARM_RETURN_REGISTERS: &[&str] = &["r0", "r1"];

const X86_EXCLUDED_OPERANDS: &[&str] = &["ptr", "byte", "word", "dword", "qword"];

const X86_MNEMONIC_PREFIXES: &[&str] = &["lock", "rep", "repe", "repz", "repne", "repnz"];

fn families(arch: Architecture) -> &'static [Family] {
    match arch {
        Architecture::X86 => X86_FAMILIES,
        Architecture::X64 => X64_FAMILIES,
        Architecture::Arm => ARM_FAMILIES,
    }
}

/// Whether `token` names a register the scanner should record.
pub fn is_register(arch: Architecture, token: &str) -> bool {
    match arch {
        Architecture::Arm => ARM_REGISTERS.contains(&token),
        Architecture::X86 | Architecture::X64 => {
            SEGMENT_REGISTERS.contains(&token)
                || families(arch).iter().any(|family| family.iter().any(|view| view.name == token))
        }
    }
}

/// Size keywords and similar tokens that look like names but carry no dataflow.
pub fn excluded_operands(arch: Architecture) -> &'static [&'static str] {
    match arch {
        Architecture::X86 | Architecture::X64 => X86_EXCLUDED_OPERANDS,
        Architecture::Arm => &[],
    }
}

/// Multi-word mnemonic prefixes the tokenizer keeps attached to the mnemonic.
pub fn mnemonic_prefixes(arch: Architecture) -> &'static [&'static str] {
    match arch {
        Architecture::X86 | Architecture::X64 => X86_MNEMONIC_PREFIXES,
        Architecture::Arm => &[],
    }
}

/// Every name that aliases `name` in the given mode, including `name` itself.
///
/// Returns `None` for names without aliases (memory expressions, the stack
/// sentinel, and ARM core registers).
pub fn register_aliases(
    arch: Architecture,
    name: &str,
    mode: AliasMode,
) -> Option<Vec<&'static str>> {
    for family in families(arch) {
        let Some(view) = family.iter().find(|view| view.name == name) else {
            continue;
        };

        let aliases = match mode {
            AliasMode::MarkTainted => family
                .iter()
                .filter(|other| other.lo < view.hi && view.lo < other.hi)
                .map(|other| other.name)
                .collect(),
            AliasMode::ClearTainted => {
                let (lo, hi) = written_range(arch, family, view);
                family
                    .iter()
                    .filter(|other| other.lo >= lo && other.hi <= hi)
                    .map(|other| other.name)
                    .collect()
            }
        };
        return Some(aliases);
    }
    None
}

/// Bits actually overwritten by a write to `view`.
fn written_range(arch: Architecture, family: Family, view: &View) -> (u8, u8) {
    // 32-bit writes zero-extend into the full 64-bit register.
    let widest = family.iter().map(|other| other.hi).max().unwrap_or(view.hi);
    if arch == Architecture::X64 && view.lo == 0 && view.hi == 32 && widest == 64 {
        (0, 64)
    } else {
        (view.lo, view.hi)
    }
}

fn ordered(set: &OperandSet, order: &'static [&'static str]) -> Vec<Operand> {
    let mut out: Vec<Operand> =
        order.iter().filter(|name| set.contains(name)).map(|name| Operand::fixed(*name)).collect();
    for op in set {
        if !order.contains(&op.as_str()) {
            out.push(op.clone());
        }
    }
    out
}

/// Registers of `set` in the order a multi-register push stores them.
///
/// Only architectures that allow multi-register pushes have an order.
pub fn operands_in_push_order(arch: Architecture, set: &OperandSet) -> Option<Vec<Operand>> {
    match arch {
        Architecture::Arm => Some(ordered(set, ARM_PUSH_ORDER)),
        Architecture::X86 | Architecture::X64 => None,
    }
}

/// Registers of `set` in the order a multi-register pop loads them.
pub fn operands_in_pop_order(arch: Architecture, set: &OperandSet) -> Option<Vec<Operand>> {
    match arch {
        Architecture::Arm => Some(ordered(set, ARM_POP_ORDER)),
        Architecture::X86 | Architecture::X64 => None,
    }
}
