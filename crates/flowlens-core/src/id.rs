//! Stable ID newtypes for trace entities.
//!
//! All IDs are distinct newtype wrappers over integers, providing type safety
//! so that a sequence index cannot be accidentally used where a stage position
//! is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Execution-order sequence index of one observed element occurrence.
///
/// Assigned by the instrumentation in strict execution order, globally unique
/// within one traced run. This is the *only* identity used for structural
/// equality inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeqId(pub u32);

impl SeqId {
    /// Sentinel index for the synthesized terminal result element. Maximal,
    /// so the result always sorts after every observed occurrence.
    pub const RESULT: SeqId = SeqId(u32::MAX);

    /// Whether this is the synthesized terminal result sentinel.
    pub fn is_result(self) -> bool {
        self == SeqId::RESULT
    }
}

/// Position of a call within the pipeline (0 = producer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageId(pub u32);

impl StageId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for SeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_result() {
            write!(f, "result")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
