//! One observed element occurrence at a stage boundary.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::handle::{SessionClock, ValueHandle};
use crate::id::SeqId;

/// One occurrence of data observed at a stage boundary.
///
/// Identity, ordering, and hashing are by [`SeqId`] alone: the sequence index
/// is globally unique within a traced run, while the handle is a volatile
/// borrow that carries no structural identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceElement {
    seq: SeqId,
    handle: ValueHandle,
}

impl TraceElement {
    pub fn new(seq: SeqId, handle: ValueHandle) -> Self {
        TraceElement { seq, handle }
    }

    /// The synthesized terminal result element (maximal sequence index),
    /// standing in for the pipeline's returned value when the terminal
    /// operation has no natural per-element trace.
    pub fn result(handle: ValueHandle) -> Self {
        TraceElement::new(SeqId::RESULT, handle)
    }

    /// Sentinel for a void-returning terminal.
    pub fn void_result(clock: &SessionClock) -> Self {
        TraceElement::result(ValueHandle::void(clock))
    }

    pub fn seq(&self) -> SeqId {
        self.seq
    }

    pub fn handle(&self) -> &ValueHandle {
        &self.handle
    }
}

impl PartialEq for TraceElement {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for TraceElement {}

impl Hash for TraceElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seq.hash(state);
    }
}

impl PartialOrd for TraceElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TraceElement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seq.cmp(&other.seq)
    }
}
