//! Local lineage fragment produced by one resolver invocation.

use flowlens_core::{SeqId, StageTrace};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Ordered neighbor list. Almost every mapping is empty or a singleton;
/// fan-out beyond two elements spills to the heap.
pub type Neighbors = SmallVec<[SeqId; 2]>;

/// Forward and backward element correspondence across one stage.
///
/// Totality invariant: every element of the stage's `before` set is a key of
/// `forward` and every element of `after` is a key of `backward`, with an
/// empty neighbor list meaning "dropped here" (forward) or "no traceable
/// origin" (backward). [`LineageFragment::seeded`] establishes the invariant
/// up front; the link methods only ever add neighbors.
///
/// The two maps are kept separate rather than derived from one edge set
/// because they are not always symmetric: a deduplication stage maps every
/// duplicate forward to the survivor while the survivor's backward list
/// names only its own originating occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageFragment {
    forward: IndexMap<SeqId, Neighbors>,
    backward: IndexMap<SeqId, Neighbors>,
}

impl LineageFragment {
    /// A fragment with every `before` key in `forward` and every `after` key
    /// in `backward`, all mapped to empty neighbor lists. Keys are inserted
    /// in execution-time order.
    pub fn seeded(trace: &StageTrace) -> Self {
        let mut fragment = LineageFragment::default();
        for element in trace.sorted_before() {
            fragment.forward.entry(element.seq()).or_default();
        }
        for element in trace.sorted_after() {
            fragment.backward.entry(element.seq()).or_default();
        }
        fragment
    }

    /// Links `from` (a `before` element) to `to` (an `after` element) in
    /// both directions.
    pub fn link(&mut self, from: SeqId, to: SeqId) {
        self.link_forward(from, to);
        self.link_backward(to, from);
    }

    /// Records that `from` contributed to `to`, visible in the forward
    /// direction only.
    pub fn link_forward(&mut self, from: SeqId, to: SeqId) {
        self.forward.entry(from).or_default().push(to);
    }

    /// Records that `to` originated from `from`, visible in the backward
    /// direction only.
    pub fn link_backward(&mut self, to: SeqId, from: SeqId) {
        self.backward.entry(to).or_default().push(from);
    }

    /// After-elements the given before-element maps to. Empty slice for
    /// dropped or unknown elements.
    pub fn forward_of(&self, seq: SeqId) -> &[SeqId] {
        self.forward.get(&seq).map(|n| n.as_slice()).unwrap_or(&[])
    }

    /// Before-elements the given after-element originated from.
    pub fn backward_of(&self, seq: SeqId) -> &[SeqId] {
        self.backward.get(&seq).map(|n| n.as_slice()).unwrap_or(&[])
    }

    pub fn forward(&self) -> &IndexMap<SeqId, Neighbors> {
        &self.forward
    }

    pub fn backward(&self) -> &IndexMap<SeqId, Neighbors> {
        &self.backward
    }

    /// Checks the totality invariant against the trace this fragment was
    /// resolved from.
    pub fn is_total_for(&self, trace: &StageTrace) -> bool {
        trace.before().keys().all(|seq| self.forward.contains_key(seq))
            && trace.after().keys().all(|seq| self.backward.contains_key(seq))
    }
}
