//! The resolved chain: the immutable, bidirectionally navigable output of
//! trace resolution.
//!
//! A [`ResolvedChain`] owns one [`StageState`] per pipeline call. State `i`
//! holds the elements observed at the boundary *after* call `i` (the
//! terminator state holds the result element), its backward links into the
//! previous boundary, and its forward links into the next one. On top of the
//! per-state maps the chain assembles a single directed lineage graph over
//! every element occurrence, which answers the transitive query the
//! rendering layer needs: select an element anywhere, highlight its lineage
//! at every other boundary.
//!
//! Edges carry per-direction visibility because forward and backward maps
//! are not always symmetric: a deduplication stage points every duplicate
//! forward at the survivor while the survivor's backward list names only its
//! own originating occurrence, so duplicate edges are forward-only.

use flowlens_core::{PipelineCall, SeqId, TraceElement};
use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::fragment::Neighbors;

/// One stage boundary of the resolved chain.
#[derive(Debug, Clone)]
pub struct StageState {
    call: PipelineCall,
    next_call: Option<PipelineCall>,
    elements: IndexMap<SeqId, TraceElement>,
    to_prev: IndexMap<SeqId, Neighbors>,
    to_next: IndexMap<SeqId, Neighbors>,
}

impl StageState {
    pub(crate) fn new(
        call: PipelineCall,
        next_call: Option<PipelineCall>,
        elements: IndexMap<SeqId, TraceElement>,
        to_prev: IndexMap<SeqId, Neighbors>,
        to_next: IndexMap<SeqId, Neighbors>,
    ) -> Self {
        StageState {
            call,
            next_call,
            elements,
            to_prev,
            to_next,
        }
    }

    /// The call this state is the output boundary of.
    pub fn call(&self) -> &PipelineCall {
        &self.call
    }

    /// The call consuming this boundary, if any.
    pub fn next_call(&self) -> Option<&PipelineCall> {
        self.next_call.as_ref()
    }

    /// Elements at this boundary, in execution-time order.
    pub fn elements(&self) -> impl Iterator<Item = &TraceElement> {
        self.elements.values()
    }

    pub fn element(&self, seq: SeqId) -> Option<&TraceElement> {
        self.elements.get(&seq)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn prev_seqs(&self, seq: SeqId) -> &[SeqId] {
        self.to_prev.get(&seq).map(|n| n.as_slice()).unwrap_or(&[])
    }

    fn next_seqs(&self, seq: SeqId) -> &[SeqId] {
        self.to_next.get(&seq).map(|n| n.as_slice()).unwrap_or(&[])
    }
}

/// Per-edge direction visibility in the lineage graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LinkVis {
    forward: bool,
    backward: bool,
}

/// Transitive lineage of one selected element: the set of related sequence
/// indices at every stage boundary, including the selection itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    marked: Vec<IndexSet<SeqId>>,
}

impl Lineage {
    /// Related elements at the given stage boundary, or `None` for a stage
    /// index the chain does not have.
    pub fn at(&self, stage: usize) -> Option<&IndexSet<SeqId>> {
        self.marked.get(stage)
    }

    pub fn contains(&self, stage: usize, seq: SeqId) -> bool {
        self.marked.get(stage).is_some_and(|set| set.contains(&seq))
    }
}

/// Ordered sequence of stage states plus the assembled lineage graph.
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct ResolvedChain {
    states: Vec<StageState>,
    exception_thrown: bool,
    graph: DiGraph<(usize, SeqId), LinkVis>,
    nodes: IndexMap<(usize, SeqId), NodeIndex>,
}

impl ResolvedChain {
    pub(crate) fn assemble(states: Vec<StageState>, exception_thrown: bool) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = IndexMap::new();
        for (stage, state) in states.iter().enumerate() {
            for seq in state.elements.keys() {
                let idx = graph.add_node((stage, *seq));
                nodes.insert((stage, *seq), idx);
            }
        }

        let mut chain = ResolvedChain {
            states,
            exception_thrown,
            graph,
            nodes,
        };
        for stage in 0..chain.states.len() {
            if stage > 0 {
                for (seq, prevs) in chain.states[stage].to_prev.clone() {
                    for prev in prevs {
                        chain.mark_link(stage - 1, prev, stage, seq, |vis| {
                            vis.backward = true;
                        });
                    }
                }
            }
            for (seq, nexts) in chain.states[stage].to_next.clone() {
                for next in nexts {
                    chain.mark_link(stage, seq, stage + 1, next, |vis| {
                        vis.forward = true;
                    });
                }
            }
        }
        chain
    }

    fn mark_link(
        &mut self,
        from_stage: usize,
        from: SeqId,
        to_stage: usize,
        to: SeqId,
        set: impl FnOnce(&mut LinkVis),
    ) {
        let (Some(&a), Some(&b)) = (
            self.nodes.get(&(from_stage, from)),
            self.nodes.get(&(to_stage, to)),
        ) else {
            // Links into boundaries the trace never materialized (e.g. the
            // producer's empty input side) have no node to attach to.
            return;
        };
        let edge = self
            .graph
            .find_edge(a, b)
            .unwrap_or_else(|| self.graph.add_edge(a, b, LinkVis::default()));
        set(&mut self.graph[edge]);
    }

    /// Number of stage states; equals the pipeline's call count.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[StageState] {
        &self.states
    }

    pub fn state(&self, stage: usize) -> Option<&StageState> {
        self.states.get(stage)
    }

    /// The terminator boundary's result element, if the run produced one.
    pub fn result(&self) -> Option<&TraceElement> {
        self.states.last().and_then(|state| state.elements.values().next_back())
    }

    /// Whether the traced run terminated with an exception.
    pub fn exception_thrown(&self) -> bool {
        self.exception_thrown
    }

    /// Elements at boundary `stage - 1` the given element originated from,
    /// in execution-time order. Empty for the producer boundary and for
    /// elements with no traceable origin.
    pub fn neighbors_before(&self, stage: usize, seq: SeqId) -> Vec<&TraceElement> {
        let Some(state) = self.states.get(stage) else {
            return Vec::new();
        };
        if stage == 0 {
            return Vec::new();
        }
        let prev_state = &self.states[stage - 1];
        let mut neighbors: Vec<&TraceElement> = state
            .prev_seqs(seq)
            .iter()
            .filter_map(|prev| prev_state.element(*prev))
            .collect();
        neighbors.sort();
        neighbors
    }

    /// Elements at boundary `stage + 1` the given element produced, in
    /// execution-time order. Empty for the terminator boundary and for
    /// elements dropped by the next stage.
    pub fn neighbors_after(&self, stage: usize, seq: SeqId) -> Vec<&TraceElement> {
        let Some(state) = self.states.get(stage) else {
            return Vec::new();
        };
        let Some(next_state) = self.states.get(stage + 1) else {
            return Vec::new();
        };
        let mut neighbors: Vec<&TraceElement> = state
            .next_seqs(seq)
            .iter()
            .filter_map(|next| next_state.element(*next))
            .collect();
        neighbors.sort();
        neighbors
    }

    /// Transitive lineage of one element: everything reachable forward via
    /// forward-visible links and backward via backward-visible links, across
    /// all boundaries.
    pub fn lineage_of(&self, stage: usize, seq: SeqId) -> Lineage {
        let mut marked = vec![IndexSet::new(); self.states.len()];
        let Some(&start) = self.nodes.get(&(stage, seq)) else {
            return Lineage { marked };
        };

        for (direction, visible) in [
            (Direction::Outgoing, LinkVis { forward: true, backward: false }),
            (Direction::Incoming, LinkVis { forward: false, backward: true }),
        ] {
            let mut stack = vec![start];
            let mut seen: IndexSet<NodeIndex> = IndexSet::new();
            seen.insert(start);
            while let Some(node) = stack.pop() {
                let (node_stage, node_seq) = self.graph[node];
                marked[node_stage].insert(node_seq);
                for edge in self.graph.edges_directed(node, direction) {
                    let vis = edge.weight();
                    let passable = (visible.forward && vis.forward)
                        || (visible.backward && vis.backward);
                    if !passable {
                        continue;
                    }
                    let next = if direction == Direction::Outgoing {
                        edge.target()
                    } else {
                        edge.source()
                    };
                    if seen.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }

        Lineage { marked }
    }
}
