//! End-to-end crash triage: build the faulting block, propagate taint from
//! the faulting instruction, and bucket the crash by stack hash.

use log::{debug, info, warn};
use thiserror::Error;

use super::host::{DebuggerHost, HostError};
use crate::config::AnalysisConfig;
use crate::db::{DbError, TriageDb};
use crate::disasm::{self, DisassemblyError};
use crate::hash::{Frame, StackHash};
use crate::model::{Architecture, Instruction, InstructionClass, OperandSet};
use crate::taint::{self, TaintStatus};

#[derive(Debug, Error)]
pub enum TriageError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Faulting instruction at {address:#x} could not be disassembled: {source}")]
    Disassembly {
        address: u64,
        #[source]
        source: DisassemblyError,
    },

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type TriageResult<T> = Result<T, TriageError>;

/// Disassemble forward from `start` into one basic block.
///
/// The block ends after a branch, return or interrupt, when the host has no
/// further instructions, or at `config.max_block_instructions`. Flags from
/// the host stay valid until the first instruction that modifies them. A
/// failure on the first instruction is an error; a later one ends the block
/// early.
pub fn build_basic_block<H: DebuggerHost + ?Sized>(
    host: &H,
    start: u64,
    config: &AnalysisConfig,
) -> TriageResult<Vec<Instruction>> {
    let arch = host.architecture();
    let flags = host.processor_flags();
    let mut flags_valid = flags.valid;
    let mut block: Vec<Instruction> = Vec::new();
    let mut address = start;

    while block.len() < config.max_block_instructions {
        let line = match host.disassemble(address) {
            Ok(line) => line,
            Err(err) if block.is_empty() => return Err(err.into()),
            Err(err) => {
                debug!("block ends at {address:#x}: {err}");
                break;
            }
        };

        let instruction = match disasm::disassemble(
            &line.text,
            line.next_address,
            arch,
            flags_valid,
            &flags,
        ) {
            Ok(instruction) => instruction,
            Err(source) if block.is_empty() => {
                return Err(TriageError::Disassembly { address, source });
            }
            Err(err) => {
                warn!("truncating basic block at {address:#x}: {err}");
                break;
            }
        };

        if instruction.flags_modified {
            flags_valid = false;
        }
        let terminates = instruction.ends_block();
        let next = instruction.next_address;
        block.push(instruction);

        match next {
            Some(next) if !terminates => address = next,
            _ => break,
        }
    }

    debug!("built block of {} instructions from {start:#x}", block.len());
    Ok(block)
}

/// Per-instruction slice of a triage report.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InstructionReport {
    pub address: u64,
    pub text: String,
    pub class: InstructionClass,
    pub flags_modified: bool,
    pub source: OperandSet,
    pub destination: OperandSet,
    pub destination_pointer: OperandSet,
    pub passed_or_returned: OperandSet,
    pub tainted_input: OperandSet,
}

impl From<&Instruction> for InstructionReport {
    fn from(instruction: &Instruction) -> Self {
        Self {
            address: instruction.address,
            text: instruction.text().to_string(),
            class: instruction.class,
            flags_modified: instruction.flags_modified,
            source: instruction.source.clone(),
            destination: instruction.destination.clone(),
            destination_pointer: instruction.destination_pointer.clone(),
            passed_or_returned: instruction.passed_or_returned.clone(),
            tainted_input: instruction.tainted_input.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TriageReport {
    pub architecture: Architecture,
    pub fault_address: u64,
    pub status: TaintStatus,
    pub succeeded: bool,
    pub instructions: Vec<InstructionReport>,
    pub final_taint: OperandSet,
    pub final_clear: OperandSet,
    pub stack_hash: StackHash,
}

impl TriageReport {
    pub fn faulting_instruction(&self) -> Option<&InstructionReport> {
        self.instructions.first()
    }

    /// Instructions after the fault that consumed tainted input.
    pub fn tainted_instructions(&self) -> impl Iterator<Item = &InstructionReport> {
        self.instructions.iter().skip(1).filter(|report| !report.tainted_input.is_empty())
    }
}

/// Triage one crash.
pub fn run_triage<H: DebuggerHost + ?Sized>(
    host: &H,
    fault_address: u64,
    frames: &[Frame],
    config: &AnalysisConfig,
) -> TriageResult<TriageReport> {
    let arch = host.architecture();
    let mut block = build_basic_block(host, fault_address, config)?;
    let outcome = taint::assign_taint(arch, config.taint_destination_pointers, &mut block);
    let stack_hash = config.stack_hasher().hash(frames);

    info!(
        "triaged fault at {fault_address:#x}: {} instructions, {}, bucket {stack_hash}",
        block.len(),
        outcome.status.as_str()
    );

    Ok(TriageReport {
        architecture: arch,
        fault_address,
        status: outcome.status,
        succeeded: outcome.succeeded(),
        instructions: block.iter().map(InstructionReport::from).collect(),
        final_taint: outcome.taint,
        final_clear: outcome.clear,
        stack_hash,
    })
}

/// Triage one crash and store it in `db`. Returns the report and the new
/// crash row id.
pub fn run_and_record<H: DebuggerHost + ?Sized>(
    host: &H,
    fault_address: u64,
    frames: &[Frame],
    config: &AnalysisConfig,
    db: &TriageDb,
) -> TriageResult<(TriageReport, i64)> {
    let report = run_triage(host, fault_address, frames, config)?;
    let id = db.record_crash(&report)?;
    debug!("recorded crash {id} in bucket {}", report.stack_hash);
    Ok((report, id))
}
