//! The lineage stitcher: from raw snapshot to resolved chain.
//!
//! A [`TraceSnapshot`] owns everything the evaluation collaborator gathered
//! for one traced run: the pipeline call descriptors, one stage trace per
//! call, the terminal value (or void marker), the exception flag, and the
//! session clock the value handles were captured against. Its `resolve`
//! method is the engine's single entry point -- a plain synchronous function
//! with no shared state across invocations, so distinct snapshots may be
//! resolved concurrently.
//!
//! Resolution proceeds in three phases: validate the snapshot's structure,
//! resolve every stage independently into its local fragment, then stitch
//! adjacent fragments into the chain of stage states. The structural
//! invariant making the stitch possible is adjacency duality: stage `i`'s
//! `after` elements are exactly stage `i + 1`'s `before` elements, so two
//! neighboring fragments compose without re-deriving anything.

use flowlens_core::{
    CallRole, PipelineCall, SessionClock, StageId, StageTrace, TerminalValue, TraceElement,
    TraceError,
};
use indexmap::IndexMap;
use tracing::debug;

use crate::chain::{ResolvedChain, StageState};
use crate::fragment::LineageFragment;
use crate::registry::ResolverKind;

/// Tunables for one resolution.
#[derive(Debug, Clone)]
pub struct ResolveConfig {
    /// Verify adjacency duality between neighboring stage traces before
    /// stitching. Violations surface as `MalformedTraceShape`.
    pub validate_adjacency: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        ResolveConfig {
            validate_adjacency: true,
        }
    }
}

/// An immutable, fully collected trace of one pipeline run.
#[derive(Debug, Clone)]
pub struct TraceSnapshot {
    calls: Vec<PipelineCall>,
    traces: Vec<StageTrace>,
    result: TerminalValue,
    exception_thrown: bool,
    clock: SessionClock,
}

impl TraceSnapshot {
    pub fn new(
        calls: Vec<PipelineCall>,
        traces: Vec<StageTrace>,
        result: TerminalValue,
        exception_thrown: bool,
        clock: SessionClock,
    ) -> Self {
        TraceSnapshot {
            calls,
            traces,
            result,
            exception_thrown,
            clock,
        }
    }

    pub fn calls(&self) -> &[PipelineCall] {
        &self.calls
    }

    pub fn traces(&self) -> &[StageTrace] {
        &self.traces
    }

    pub fn exception_thrown(&self) -> bool {
        self.exception_thrown
    }

    /// Resolves the snapshot into a lineage chain with default settings.
    pub fn resolve(&self) -> Result<ResolvedChain, TraceError> {
        self.resolve_with(&ResolveConfig::default())
    }

    /// Resolves the snapshot into a lineage chain.
    pub fn resolve_with(&self, config: &ResolveConfig) -> Result<ResolvedChain, TraceError> {
        if self.calls.len() != self.traces.len() {
            return Err(TraceError::InconsistentTraceLength {
                calls: self.calls.len(),
                traces: self.traces.len(),
            });
        }
        if self.calls.len() < 2 {
            return Err(TraceError::MalformedTraceShape {
                stage: StageId(0),
                operation: "<pipeline>".to_owned(),
                reason: "a pipeline needs at least a producer and a terminator".to_owned(),
            });
        }
        debug!(stages = self.calls.len(), "resolving trace snapshot");

        // Give the terminal stage its result element when the instrumentation
        // produced no natural per-element trace for it.
        let mut traces = self.traces.clone();
        let terminal = traces.last_mut().expect("length checked above");
        if terminal.after().is_empty() {
            terminal.push_after(self.synthesize_result());
        }

        if config.validate_adjacency {
            validate_adjacency(&self.calls, &traces)?;
        }

        // Per-stage resolution is order-independent and pure.
        let mut fragments = Vec::with_capacity(traces.len());
        for (index, (call, trace)) in self.calls.iter().zip(&traces).enumerate() {
            let stage = StageId(index as u32);
            let kind = ResolverKind::for_call(call);
            let fragment = kind.resolve(stage, call, trace, &self.clock)?;
            debug_assert!(fragment.is_total_for(trace));
            fragments.push(fragment);
        }

        let states = self.build_states(&traces, &fragments);
        debug!(states = states.len(), "trace snapshot resolved");
        Ok(ResolvedChain::assemble(states, self.exception_thrown))
    }

    /// One state per call: state `i` is the boundary after call `i`, linked
    /// backward through call `i`'s fragment and forward through call
    /// `i + 1`'s.
    fn build_states(&self, traces: &[StageTrace], fragments: &[LineageFragment]) -> Vec<StageState> {
        let mut states = Vec::with_capacity(self.calls.len());
        for (index, call) in self.calls.iter().enumerate() {
            let elements: IndexMap<_, _> = traces[index]
                .sorted_after()
                .into_iter()
                .map(|element| (element.seq(), element.clone()))
                .collect();
            let to_prev = fragments[index].backward().clone();
            let to_next = fragments
                .get(index + 1)
                .map(|next| next.forward().clone())
                .unwrap_or_default();
            states.push(StageState::new(
                call.clone(),
                self.calls.get(index + 1).cloned(),
                elements,
                to_prev,
                to_next,
            ));
        }
        states
    }

    fn synthesize_result(&self) -> TraceElement {
        match &self.result {
            TerminalValue::Value(handle) => TraceElement::result(handle.clone()),
            TerminalValue::Void => TraceElement::void_result(&self.clock),
        }
    }
}

/// Checks that stage `i`'s `after` sequence indices are exactly stage
/// `i + 1`'s `before` indices. The terminal stage's own `after` (the result)
/// has no successor to agree with.
fn validate_adjacency(calls: &[PipelineCall], traces: &[StageTrace]) -> Result<(), TraceError> {
    for (index, window) in traces.windows(2).enumerate() {
        let (current, next) = (&window[0], &window[1]);
        let matches = current.after().len() == next.before().len()
            && current.after().keys().all(|seq| next.before().contains_key(seq));
        if !matches {
            return Err(TraceError::MalformedTraceShape {
                stage: StageId(index as u32 + 1),
                operation: calls[index + 1].name().to_owned(),
                reason: format!(
                    "adjacency broken: stage {} produced {} elements, stage {} consumed {}",
                    index,
                    current.after().len(),
                    index + 1,
                    next.before().len()
                ),
            });
        }
    }

    // Producer and terminator shape invariants.
    if let Some(first) = traces.first() {
        if calls[0].role() == CallRole::Producer && !first.before().is_empty() {
            return Err(TraceError::MalformedTraceShape {
                stage: StageId(0),
                operation: calls[0].name().to_owned(),
                reason: "producer stage must have an empty input trace".to_owned(),
            });
        }
    }
    if let Some(last) = traces.last() {
        if calls[calls.len() - 1].role() == CallRole::Terminator && last.after().len() > 1 {
            return Err(TraceError::MalformedTraceShape {
                stage: StageId(calls.len() as u32 - 1),
                operation: calls[calls.len() - 1].name().to_owned(),
                reason: format!(
                    "terminal stage must trace at most one result element, got {}",
                    last.after().len()
                ),
            });
        }
    }
    Ok(())
}
