//! Debugger host seam.
//!
//! Everything the analysis needs from a live debugger (or a saved session)
//! goes through `DebuggerHost`. `ListingHost` replays a text listing so the
//! analysis can run offline and in tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::disasm::fields;
use crate::hash::Frame;
use crate::model::{Architecture, ProcessorFlags};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("No instruction at address {0:#x}")]
    NoInstruction(u64),

    #[error("Listing line {line_no} is not an instruction or symbol label: '{line}'")]
    InvalidListingLine { line_no: usize, line: String },

    #[error("Failed to read listing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type HostResult<T> = Result<T, HostError>;

/// Disassembly text for one address plus where the next instruction starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassembledLine {
    pub text: String,
    pub next_address: Option<u64>,
}

/// Services a debugger provides to the analysis.
pub trait DebuggerHost {
    fn architecture(&self) -> Architecture;

    /// Render the instruction at `address` in `address opcode mnemonic
    /// arguments` layout.
    fn disassemble(&self, address: u64) -> HostResult<DisassembledLine>;

    /// Processor flags at the faulting instruction.
    fn processor_flags(&self) -> ProcessorFlags;

    /// Nearest symbol at or below `address`, with the displacement from it.
    fn resolve_symbol(&self, address: u64) -> Option<(String, u64)>;
}

/// Resolve raw return addresses into hashable frames.
pub fn resolve_frames<H: DebuggerHost + ?Sized>(host: &H, addresses: &[u64]) -> Vec<Frame> {
    addresses
        .iter()
        .map(|address| match host.resolve_symbol(*address) {
            Some((name, displacement)) => Frame::resolved(name, displacement),
            None => Frame::unknown(),
        })
        .collect()
}

/// A host backed by a saved disassembly listing.
///
/// Instruction lines start with a hexadecimal address. A line of the form
/// `module!symbol:` or `module!symbol+0x10:` labels the instruction that
/// follows it. Blank lines are ignored. The next address of each instruction
/// is the address on the following instruction line.
#[derive(Debug, Clone)]
pub struct ListingHost {
    architecture: Architecture,
    flags: ProcessorFlags,
    lines: Vec<(u64, String)>,
    index: BTreeMap<u64, usize>,
    symbols: BTreeMap<u64, String>,
}

impl ListingHost {
    pub fn parse(
        listing: &str,
        architecture: Architecture,
        flags: ProcessorFlags,
    ) -> HostResult<Self> {
        let mut host = Self {
            architecture,
            flags,
            lines: Vec::new(),
            index: BTreeMap::new(),
            symbols: BTreeMap::new(),
        };
        let mut pending_label: Option<Frame> = None;

        for (line_no, raw) in listing.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(label) = line.strip_suffix(':') {
                if let Ok(frame) = label.parse::<Frame>() {
                    pending_label = Some(frame);
                    continue;
                }
            }

            let address = line
                .split_whitespace()
                .next()
                .and_then(fields::parse_address)
                .ok_or_else(|| HostError::InvalidListingLine {
                    line_no: line_no + 1,
                    line: line.to_string(),
                })?;

            if let Some(Frame { symbol: Some(name), displacement }) = pending_label.take() {
                host.symbols.insert(address.wrapping_sub(displacement), name);
            }
            host.index.entry(address).or_insert(host.lines.len());
            host.lines.push((address, line.to_string()));
        }
        Ok(host)
    }

    pub fn load(
        path: impl AsRef<Path>,
        architecture: Architecture,
        flags: ProcessorFlags,
    ) -> HostResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| HostError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&text, architecture, flags)
    }

    /// Add or replace a symbol starting at `address`.
    pub fn with_symbol(mut self, address: u64, name: impl Into<String>) -> Self {
        self.symbols.insert(address, name.into());
        self
    }

    /// Address of the first instruction line.
    pub fn first_address(&self) -> Option<u64> {
        self.lines.first().map(|(address, _)| *address)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl DebuggerHost for ListingHost {
    fn architecture(&self) -> Architecture {
        self.architecture
    }

    fn disassemble(&self, address: u64) -> HostResult<DisassembledLine> {
        let position = *self.index.get(&address).ok_or(HostError::NoInstruction(address))?;
        let text = self.lines[position].1.clone();
        let next_address = self.lines.get(position + 1).map(|(next, _)| *next);
        Ok(DisassembledLine { text, next_address })
    }

    fn processor_flags(&self) -> ProcessorFlags {
        self.flags
    }

    fn resolve_symbol(&self, address: u64) -> Option<(String, u64)> {
        self.symbols
            .range(..=address)
            .next_back()
            .map(|(start, name)| (name.clone(), address - start))
    }
}
