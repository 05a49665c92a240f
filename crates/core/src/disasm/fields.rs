//! Field tokenizer for one line of rendered disassembly.
//!
//! Lines follow the debugger layout `address opcode-bytes mnemonic arguments`,
//! with runs of spaces or tabs between fields. Nothing is modified; the tokenizer
//! returns byte ranges into the line.

use std::ops::Range;

/// Byte ranges of the four fields of a disassembly line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassemblyFields {
    pub address: Range<usize>,
    pub opcode: Range<usize>,
    pub mnemonic: Range<usize>,
    pub arguments: Range<usize>,
}

/// Read one whitespace-delimited field starting at `start`.
///
/// Whitespace ends the field unless the text from `start` up to it is one
/// of `prefixes`, which keeps `lock cmpxchg` together as a single mnemonic.
/// Returns the field's range and the offset where the next field begins
/// (after any run of whitespace).
pub fn next_field(text: &str, start: usize, prefixes: &[&str]) -> (Range<usize>, usize) {
    let bytes = text.as_bytes();
    let mut pos = start;

    while pos < bytes.len() {
        if bytes[pos].is_ascii_whitespace() {
            let so_far = &text[start..pos];
            if !prefixes.contains(&so_far) {
                break;
            }
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            continue;
        }
        pos += 1;
    }

    let field = start..pos;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    (field, pos)
}

/// Split a line into its four fields.
///
/// Returns `None` when the address, opcode or mnemonic field is missing.
/// Trailing line terminators and whitespace are left out of the argument
/// range.
pub fn split_fields(text: &str, mnemonic_prefixes: &[&str]) -> Option<DisassemblyFields> {
    let text = text.trim_end();
    let start = text.len() - text.trim_start_matches(|c: char| c.is_ascii_whitespace()).len();

    let (address, rest) = next_field(text, start, &[]);
    let (opcode, rest) = next_field(text, rest, &[]);
    let (mnemonic, rest) = next_field(text, rest, mnemonic_prefixes);

    if address.is_empty() || opcode.is_empty() || mnemonic.is_empty() {
        return None;
    }

    Some(DisassemblyFields { address, opcode, mnemonic, arguments: rest..text.len() })
}

/// Parse an address field such as `0040100a` or `00007ff6`12345678`.
pub fn parse_address(field: &str) -> Option<u64> {
    let digits: String = field.chars().filter(|c| *c != '`').collect();
    let digits = digits.strip_prefix("0x").unwrap_or(digits.as_str());
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
