//! Raw per-stage trace data produced by the instrumentation collaborator.
//!
//! A [`StageTrace`] is the immutable before/after element snapshot for one
//! pipeline stage, plus whatever auxiliary payload the stage's resolver
//! needs: an [`OccurrenceIndex`] for deduplication stages, a [`MatchProbe`]
//! for short-circuiting match terminals. Shape mismatches between a stage's
//! auxiliary payload and its resolver are reported as
//! `TraceError::MalformedTraceShape` by the resolver, not silently ignored.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::element::TraceElement;
use crate::handle::ValueHandle;
use crate::id::SeqId;

/// Value-key → ordered list of the `before` occurrences sharing that value.
///
/// Supplied by the instrumentation for deduplication stages, since
/// after-the-fact value equality alone cannot reconstruct insertion-order
/// groups once the duplicates are gone. Group order and within-group order
/// both follow the instrumentation's insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceIndex {
    groups: IndexMap<u64, Vec<SeqId>>,
}

impl OccurrenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one `before` occurrence under its value key.
    pub fn record(&mut self, value_key: u64, seq: SeqId) {
        self.groups.entry(value_key).or_default().push(seq);
    }

    /// All occurrences sharing the given value, in insertion order.
    pub fn occurrences(&self, value_key: u64) -> &[SeqId] {
        self.groups.get(&value_key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All value groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = &[SeqId]> {
        self.groups.values().map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Elements captured by the peek probe inserted before a short-circuiting
/// predicate: the visited set is the stage's `before` trace, this records
/// which of those satisfied the probe predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchProbe {
    satisfied: IndexSet<SeqId>,
}

impl MatchProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_satisfied(&mut self, seq: SeqId) {
        self.satisfied.insert(seq);
    }

    pub fn satisfied(&self) -> &IndexSet<SeqId> {
        &self.satisfied
    }

    pub fn is_satisfied(&self, seq: SeqId) -> bool {
        self.satisfied.contains(&seq)
    }
}

/// Auxiliary trace payload attached to a stage, where its resolver needs one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuxTrace {
    #[default]
    None,
    /// For deduplication stages (§ occurrence-index requirement).
    Occurrences(OccurrenceIndex),
    /// For short-circuiting match terminals.
    Match(MatchProbe),
}

/// Immutable before/after element snapshot for one pipeline stage.
///
/// Invariants (enforced by the producing instrumentation, validated by the
/// stitcher): a producer stage has an empty `before`; a terminal stage has
/// at most one `after` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTrace {
    before: IndexMap<SeqId, TraceElement>,
    after: IndexMap<SeqId, TraceElement>,
    aux: AuxTrace,
}

impl StageTrace {
    pub fn new(
        before: impl IntoIterator<Item = TraceElement>,
        after: impl IntoIterator<Item = TraceElement>,
    ) -> Self {
        StageTrace {
            before: before.into_iter().map(|e| (e.seq(), e)).collect(),
            after: after.into_iter().map(|e| (e.seq(), e)).collect(),
            aux: AuxTrace::None,
        }
    }

    pub fn with_aux(mut self, aux: AuxTrace) -> Self {
        self.aux = aux;
        self
    }

    pub fn before(&self) -> &IndexMap<SeqId, TraceElement> {
        &self.before
    }

    pub fn after(&self) -> &IndexMap<SeqId, TraceElement> {
        &self.after
    }

    pub fn aux(&self) -> &AuxTrace {
        &self.aux
    }

    /// `before` elements sorted by execution time.
    pub fn sorted_before(&self) -> Vec<&TraceElement> {
        let mut elements: Vec<&TraceElement> = self.before.values().collect();
        elements.sort();
        elements
    }

    /// `after` elements sorted by execution time.
    pub fn sorted_after(&self) -> Vec<&TraceElement> {
        let mut elements: Vec<&TraceElement> = self.after.values().collect();
        elements.sort();
        elements
    }

    /// Appends the synthesized terminal result element to `after`. Used by
    /// the stitcher when a terminal operation produced no natural
    /// per-element trace.
    pub fn push_after(&mut self, element: TraceElement) {
        self.after.insert(element.seq(), element);
    }
}

/// The pipeline's returned value, as captured by the evaluation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TerminalValue {
    /// The terminal produced a scalar/object result.
    Value(ValueHandle),
    /// Void-returning terminal (e.g. `forEach`).
    Void,
}
