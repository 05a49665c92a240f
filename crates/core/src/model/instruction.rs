use std::fmt;
use std::ops::Range;

use super::OperandSet;

/// Semantic class assigned to an instruction by the classification tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionClass {
    /// No table entry matched. Assumed to affect everything.
    #[default]
    Unknown,
    Branch,
    Return,
    /// ARM conditional instruction evaluated without valid flags.
    UnpredictableConditionalExecution,
    Interrupt,
    DataMove,
    DataExchange,
    BlockDataMove,
    StackPush,
    StackPop,
    Calculation,
    /// Did not execute (or has no effect); skipped by taint propagation.
    Noop,
    NonDisassemblable,
}

impl InstructionClass {
    /// Classes that end a basic block.
    pub fn terminates_block(self) -> bool {
        matches!(
            self,
            InstructionClass::Branch | InstructionClass::Return | InstructionClass::Interrupt
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InstructionClass::Unknown => "unknown",
            InstructionClass::Branch => "branch",
            InstructionClass::Return => "return",
            InstructionClass::UnpredictableConditionalExecution => {
                "unpredictable_conditional_execution"
            }
            InstructionClass::Interrupt => "interrupt",
            InstructionClass::DataMove => "data_move",
            InstructionClass::DataExchange => "data_exchange",
            InstructionClass::BlockDataMove => "block_data_move",
            InstructionClass::StackPush => "stack_push",
            InstructionClass::StackPop => "stack_pop",
            InstructionClass::Calculation => "calculation",
            InstructionClass::Noop => "noop",
            InstructionClass::NonDisassemblable => "non_disassemblable",
        }
    }
}

impl fmt::Display for InstructionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte range into an instruction's normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(range: Range<usize>) -> Self {
        Self { start: range.start, end: range.end }
    }

    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }
}

/// One classified line of disassembly.
///
/// The text is owned and never modified; the mnemonic, opcode and argument
/// fields are spans into it. Operand sets are filled by classification and,
/// for `tainted_input` (and rarely `source`), by the taint engine.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Instruction {
    pub address: u64,
    pub next_address: Option<u64>,
    pub class: InstructionClass,
    /// Class the instruction has when it executes. Differs from `class` only
    /// for ARM conditional instructions resolved to `Noop` or
    /// `UnpredictableConditionalExecution`.
    pub unconditional_class: InstructionClass,
    pub flags_valid: bool,
    pub flags_modified: bool,
    text: String,
    address_span: TextSpan,
    opcode_span: TextSpan,
    mnemonic_span: TextSpan,
    arguments_span: TextSpan,
    pub source: OperandSet,
    pub destination: OperandSet,
    pub destination_pointer: OperandSet,
    pub passed_or_returned: OperandSet,
    pub explicit: OperandSet,
    pub compound: OperandSet,
    pub tainted_input: OperandSet,
}

impl Instruction {
    /// Build an unclassified instruction over normalized text.
    ///
    /// Spans must lie on character boundaries of `text`; the tokenizer only
    /// produces such spans.
    pub fn from_parts(
        text: String,
        address: u64,
        next_address: Option<u64>,
        address_span: TextSpan,
        opcode_span: TextSpan,
        mnemonic_span: TextSpan,
        arguments_span: TextSpan,
    ) -> Self {
        Self {
            address,
            next_address,
            class: InstructionClass::Unknown,
            unconditional_class: InstructionClass::Unknown,
            flags_valid: false,
            flags_modified: false,
            text,
            address_span,
            opcode_span,
            mnemonic_span,
            arguments_span,
            source: OperandSet::new(),
            destination: OperandSet::new(),
            destination_pointer: OperandSet::new(),
            passed_or_returned: OperandSet::new(),
            explicit: OperandSet::new(),
            compound: OperandSet::new(),
            tainted_input: OperandSet::new(),
        }
    }

    /// Instruction with only a mnemonic and argument text, at address zero.
    ///
    /// Handy when the address and opcode bytes are irrelevant.
    pub fn synthetic(mnemonic: &str, arguments: &str) -> Self {
        let mnemonic = mnemonic.to_ascii_lowercase();
        let arguments = arguments.to_ascii_lowercase();
        let text = if arguments.is_empty() {
            mnemonic.clone()
        } else {
            format!("{mnemonic} {arguments}")
        };
        let mnemonic_span = TextSpan::new(0..mnemonic.len());
        let arguments_start = (mnemonic.len() + 1).min(text.len());
        let arguments_span = TextSpan::new(arguments_start..text.len());
        Self::from_parts(
            text,
            0,
            None,
            TextSpan::default(),
            TextSpan::default(),
            mnemonic_span,
            arguments_span,
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn slice(&self, span: TextSpan) -> &str {
        self.text.get(span.range()).unwrap_or("")
    }

    pub fn address_text(&self) -> &str {
        self.slice(self.address_span)
    }

    pub fn opcode(&self) -> &str {
        self.slice(self.opcode_span)
    }

    /// Full mnemonic field, including any prefixes (`lock cmpxchg`).
    pub fn mnemonic(&self) -> &str {
        self.slice(self.mnemonic_span)
    }

    /// Last word of the mnemonic field; what the tables are matched against.
    pub fn root_mnemonic(&self) -> &str {
        let mnemonic = self.mnemonic();
        mnemonic.rsplit(|c: char| c.is_ascii_whitespace()).next().unwrap_or(mnemonic)
    }

    pub fn arguments(&self) -> &str {
        self.slice(self.arguments_span)
    }

    /// Whether the block ends after this instruction.
    ///
    /// A conditional branch that may or may not be taken still ends the
    /// block; one known not to execute does not.
    pub fn ends_block(&self) -> bool {
        match self.class {
            InstructionClass::UnpredictableConditionalExecution => {
                self.unconditional_class.terminates_block()
            }
            class => class.terminates_block(),
        }
    }

    /// Reset everything classification computes, keeping the text.
    pub fn reset_classification(&mut self) {
        self.class = InstructionClass::Unknown;
        self.unconditional_class = InstructionClass::Unknown;
        self.flags_modified = false;
        self.source.clear();
        self.destination.clear();
        self.destination_pointer.clear();
        self.passed_or_returned.clear();
        self.explicit.clear();
        self.compound.clear();
        self.tainted_input.clear();
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self.arguments();
        if args.is_empty() {
            write!(f, "{:08x} {}", self.address, self.mnemonic())
        } else {
            write!(f, "{:08x} {} {}", self.address, self.mnemonic(), args)
        }
    }
}
