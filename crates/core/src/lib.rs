//! triage-core
//!
//! Core library for crash triage: a meta-disassembler that classifies
//! rendered disassembly, a taint tracker that follows the faulting
//! instruction's inputs through its basic block, and stack hashing for
//! bucketing crashes.
//!
//! Frontends (the `crash-triage` CLI, debugger extensions) supply
//! disassembly through `services::DebuggerHost` and keep all analysis here.

pub mod config;
pub mod db;
pub mod disasm;
pub mod hash;
pub mod model;
pub mod services;
pub mod taint;

pub use config::AnalysisConfig;
pub use disasm::{classify, disassemble, DisassemblyError};
pub use model::{Architecture, Instruction, InstructionClass, Operand, OperandSet, ProcessorFlags};
pub use taint::{assign_taint, TaintOutcome, TaintStatus};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
