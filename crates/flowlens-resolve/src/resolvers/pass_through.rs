//! Resolver for element-preserving, order-preserving operations.
//!
//! Applies to map-like transforms, boxing conversions, and non-reordering
//! peeks: the k-th `before` element corresponds to the k-th `after` element
//! by execution order. No value comparison is attempted; stage-trace
//! ordering is trusted.

use flowlens_core::{PipelineCall, StageId, StageTrace, TraceError};

use crate::fragment::LineageFragment;

/// Positional 1:1 correspondence between `before` and `after`. The operation
/// preserves cardinality, so unequal trace sides mean the instrumentation
/// lost elements and pairing them positionally would fabricate lineage.
pub fn resolve(
    stage: StageId,
    call: &PipelineCall,
    trace: &StageTrace,
) -> Result<LineageFragment, TraceError> {
    if trace.before().len() != trace.after().len() {
        return Err(TraceError::MalformedTraceShape {
            stage,
            operation: call.name().to_owned(),
            reason: format!(
                "element-preserving stage consumed {} elements but produced {}",
                trace.before().len(),
                trace.after().len()
            ),
        });
    }
    let mut fragment = LineageFragment::seeded(trace);
    for (before, after) in trace.sorted_before().iter().zip(trace.sorted_after()) {
        fragment.link(before.seq(), after.seq());
    }
    Ok(fragment)
}
