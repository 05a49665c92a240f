pub mod buckets;
pub mod classify;
pub mod hash;
pub mod taint;
pub mod triage;

pub use buckets::*;
pub use classify::*;
pub use hash::*;
pub use taint::*;
pub use triage::*;
