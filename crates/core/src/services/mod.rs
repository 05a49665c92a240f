//! Services layered on the analysis core: the debugger host seam and the
//! end-to-end triage pipeline.

pub mod host;
pub mod triage;

pub use host::{resolve_frames, DebuggerHost, DisassembledLine, HostError, ListingHost};
pub use triage::{
    build_basic_block, run_and_record, run_triage, InstructionReport, TriageError, TriageReport,
    TriageResult,
};
