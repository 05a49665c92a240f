//! Stack hashing for crash bucketing.
//!
//! A stack hash is a pair of 32-bit values. The major hash covers the names
//! of the top few frames and groups crashes by rough location; the minor hash
//! covers every frame with its displacement and separates crashes that share
//! a top of stack. Frames matching the exclusion list never contribute.

pub mod exclude;

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use thiserror::Error;

pub use exclude::{wildcard_match, ExclusionList, EXCLUDED_SYMBOLS};

/// Number of counted frames that feed the major hash.
pub const MAJOR_HASH_STACK_DEPTH: usize = 5;

/// Name used for frames whose symbol could not be resolved.
pub const UNKNOWN_FRAME: &str = "Unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    #[error("Unknown hash mode '{0}' (expected custom_v1, custom_v2 or sha256)")]
    UnknownMode(String),

    #[error("Invalid frame '{0}' (expected module!symbol+0xdisp or ?)")]
    InvalidFrame(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashMode {
    CustomV1,
    CustomV2,
    #[default]
    Sha256,
}

impl HashMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HashMode::CustomV1 => "custom_v1",
            HashMode::CustomV2 => "custom_v2",
            HashMode::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashMode {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "custom_v1" | "v1" => Ok(HashMode::CustomV1),
            "custom_v2" | "v2" => Ok(HashMode::CustomV2),
            "sha256" => Ok(HashMode::Sha256),
            other => Err(HashError::UnknownMode(other.to_string())),
        }
    }
}

/// One resolved stack frame. `symbol` is `None` when resolution failed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    pub symbol: Option<String>,
    pub displacement: u64,
}

impl Frame {
    pub fn resolved(symbol: impl Into<String>, displacement: u64) -> Self {
        Self { symbol: Some(symbol.into()), displacement }
    }

    pub fn unknown() -> Self {
        Self { symbol: None, displacement: 0 }
    }

    /// Name and displacement as they enter the hash.
    fn rendered(&self) -> (&str, u64) {
        match &self.symbol {
            Some(name) => (name.as_str(), self.displacement),
            None => (UNKNOWN_FRAME, 0),
        }
    }
}

/// Parses `module!symbol+0x1a`, `module!symbol` or `?`.
impl FromStr for Frame {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        if line == "?" {
            return Ok(Frame::unknown());
        }
        if line.is_empty() || line.contains(char::is_whitespace) {
            return Err(HashError::InvalidFrame(s.to_string()));
        }

        match line.rsplit_once('+') {
            Some((name, disp)) if !name.is_empty() => {
                let digits = disp.strip_prefix("0x").unwrap_or(disp);
                let displacement = u64::from_str_radix(digits, 16)
                    .map_err(|_| HashError::InvalidFrame(s.to_string()))?;
                Ok(Frame::resolved(name, displacement))
            }
            Some(_) => Err(HashError::InvalidFrame(s.to_string())),
            None => Ok(Frame::resolved(line, 0)),
        }
    }
}

/// How one frame was treated while hashing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HashedFrame {
    pub name: String,
    pub displacement: u64,
    pub unknown: bool,
    pub excluded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StackHash {
    pub mode: HashMode,
    pub major: u32,
    pub minor: u32,
    pub frames: Vec<HashedFrame>,
}

impl StackHash {
    pub fn contains_unknown_frames(&self) -> bool {
        self.frames.iter().any(|frame| frame.unknown)
    }
}

impl fmt::Display for StackHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}.{:#010x}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StackHasher {
    mode: HashMode,
    exclusions: ExclusionList,
}

impl StackHasher {
    pub fn new(mode: HashMode, exclusions: ExclusionList) -> Self {
        Self { mode, exclusions }
    }

    pub fn mode(&self) -> HashMode {
        self.mode
    }

    pub fn hash(&self, frames: &[Frame]) -> StackHash {
        let hashed: Vec<HashedFrame> = frames
            .iter()
            .map(|frame| {
                let (name, displacement) = frame.rendered();
                HashedFrame {
                    name: name.to_string(),
                    displacement,
                    unknown: frame.symbol.is_none(),
                    excluded: self.exclusions.is_excluded(name),
                }
            })
            .collect();

        let (major, minor) = match self.mode {
            HashMode::CustomV1 => custom_v1(&hashed),
            HashMode::CustomV2 => custom_v2(&hashed),
            HashMode::Sha256 => sha256(&hashed),
        };
        StackHash { mode: self.mode, major, minor, frames: hashed }
    }
}

/// Byte-wise XOR with a salt that rotates each byte through the four lanes
/// of the word.
fn custom_v1(frames: &[HashedFrame]) -> (u32, u32) {
    let (mut major, mut minor) = (0u32, 0u32);
    let mut salt = 0u32;
    let mut counted = 0;

    for frame in frames.iter().filter(|frame| !frame.excluded) {
        let name = if frame.unknown { frame.name.clone() } else { frame.name.to_lowercase() };
        for byte in name.bytes() {
            let lane = u32::from(byte) << (salt * 8);
            minor ^= lane;
            if counted < MAJOR_HASH_STACK_DEPTH {
                major ^= lane;
            }
            salt = (salt + 1) % 4;
        }
        counted += 1;

        minor ^= u32::from(b'+') << (salt * 8);
        // Displacements are rendered as 32-bit values.
        for byte in format!("{:x}", frame.displacement as u32).bytes() {
            minor ^= u32::from(byte) << (salt * 8);
        }
    }
    (major, minor)
}

/// Rotate-and-XOR over lowercased names; the minor hash also mixes in each
/// displacement weighted by frame position.
fn custom_v2(frames: &[HashedFrame]) -> (u32, u32) {
    let (mut major, mut minor) = (0u32, 0u32);
    let mut counted = 0;

    for (index, frame) in frames.iter().enumerate() {
        if frame.excluded {
            continue;
        }
        for byte in frame.name.bytes() {
            let c = u32::from(byte.to_ascii_lowercase());
            minor = minor.rotate_left(5) ^ c;
            if counted < MAJOR_HASH_STACK_DEPTH {
                major = major.rotate_left(5) ^ c;
            }
        }
        minor ^= frame.displacement.wrapping_mul(index as u64 + 1) as u32;
        counted += 1;
    }
    (major, minor)
}

/// SHA-256 digests folded to 32 bits. Excluded frames still count towards
/// the major hash depth.
fn sha256(frames: &[HashedFrame]) -> (u32, u32) {
    let mut major = Sha256::new();
    let mut minor = Sha256::new();

    for (index, frame) in frames.iter().enumerate() {
        if frame.excluded {
            continue;
        }
        minor.update(frame.name.as_bytes());
        if index < MAJOR_HASH_STACK_DEPTH {
            major.update(frame.name.as_bytes());
        }
        if frame.displacement != 0 {
            minor.update(b"+0x");
            minor.update(format!("{:x}", frame.displacement).as_bytes());
        }
    }
    (fold(&major.finalize()), fold(&minor.finalize()))
}

fn fold(digest: &[u8]) -> u32 {
    digest
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .fold(0, |acc, word| acc ^ word)
}
