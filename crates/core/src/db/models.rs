use serde::{Deserialize, Serialize};

/// One triaged crash as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrashRecord {
    pub id: i64,
    pub major_hash: u32,
    pub minor_hash: u32,
    /// Hash mode the pair was computed with; pairs from different modes
    /// never share a bucket.
    pub hash_mode: String,
    pub architecture: String,
    pub fault_address: u64,
    /// Text of the faulting instruction.
    pub instruction: String,
    /// Operands of the faulting instruction that were tainted.
    pub tainted_inputs: Vec<String>,
    /// Taint analysis status (`completed`, `taint_exhausted`, ...).
    pub status: String,
    /// RFC 3339 timestamp.
    pub recorded_at: String,
}

impl CrashRecord {
    /// Bucket label in the same `0x%08x.0x%08x` form as the stack hash.
    pub fn bucket(&self) -> String {
        format!("{:#010x}.{:#010x}", self.major_hash, self.minor_hash)
    }
}

/// Aggregate view of one bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketSummary {
    pub major_hash: u32,
    pub minor_hash: u32,
    pub hash_mode: String,
    pub count: u64,
    pub first_seen: String,
    pub last_seen: String,
}

impl BucketSummary {
    pub fn bucket(&self) -> String {
        format!("{:#010x}.{:#010x}", self.major_hash, self.minor_hash)
    }
}
