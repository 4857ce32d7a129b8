//! Resolver for terminal operations that reduce every input to one result.
//!
//! Applies to sum/reduce/collect-style terminals where no individual element
//! is selected: every `before` element maps forward to the singleton result
//! element, and the result maps backward to the entire ordered input. This
//! is the coarsest lineage the engine produces -- "everything contributed" --
//! used whenever finer attribution is not obtainable from the trace format.

use flowlens_core::{PipelineCall, StageId, StageTrace, TraceError};

use crate::fragment::LineageFragment;

pub fn resolve(
    stage: StageId,
    call: &PipelineCall,
    trace: &StageTrace,
) -> Result<LineageFragment, TraceError> {
    let after = trace.sorted_after();
    let [result] = after.as_slice() else {
        return Err(TraceError::MalformedTraceShape {
            stage,
            operation: call.name().to_owned(),
            reason: format!(
                "aggregating terminal must trace exactly one result element, got {}",
                after.len()
            ),
        });
    };

    let mut fragment = LineageFragment::seeded(trace);
    for element in trace.sorted_before() {
        fragment.link(element.seq(), result.seq());
    }
    Ok(fragment)
}
