//! Resolver for deduplication stages (equivalence-class collapsing).
//!
//! A deduplication stage retains one representative per distinct value. The
//! auxiliary occurrence index groups all `before` occurrences by value;
//! each survivor is matched against its group by *reference identity* (not
//! value equality) to find the specific occurrence the underlying collection
//! retained. The resulting maps are intentionally asymmetric:
//!
//! - forward: every occurrence of a value (survivor and duplicates alike)
//!   points at the single surviving `after` element, and
//! - backward: the survivor names only its own originating occurrence, so
//!   duplicates are reachable only via the forward direction.
//!
//! When several occurrences share both value and identity, the earliest
//! unclaimed occurrence in the index's insertion order wins. That is kept
//! deterministic here but is not a stable contract of the trace format.

use flowlens_core::{
    AuxTrace, PipelineCall, SeqId, SessionClock, StageId, StageTrace, TraceError,
};
use indexmap::IndexSet;

use crate::fragment::LineageFragment;

pub fn resolve(
    stage: StageId,
    call: &PipelineCall,
    trace: &StageTrace,
    clock: &SessionClock,
) -> Result<LineageFragment, TraceError> {
    let AuxTrace::Occurrences(index) = trace.aux() else {
        return Err(malformed(stage, call, "occurrence index missing"));
    };

    let mut fragment = LineageFragment::seeded(trace);
    let mut claimed: IndexSet<SeqId> = IndexSet::new();

    for survivor in trace.sorted_after() {
        // Find the value group containing the retained occurrence, by
        // identity against the live objects.
        let mut origin = None;
        'groups: for group in index.groups() {
            for &seq in group {
                let Some(candidate) = trace.before().get(&seq) else {
                    return Err(malformed(
                        stage,
                        call,
                        &format!("occurrence index names element {seq} absent from the input trace"),
                    ));
                };
                if claimed.contains(&seq) {
                    continue;
                }
                if survivor.handle().same_object(candidate.handle(), clock)? {
                    origin = Some((seq, group));
                    break 'groups;
                }
            }
        }
        let Some((origin_seq, group)) = origin else {
            return Err(malformed(
                stage,
                call,
                &format!(
                    "occurrence index holds no retained occurrence for survivor {}",
                    survivor.seq()
                ),
            ));
        };
        claimed.insert(origin_seq);

        // Whole equivalence class forward to the survivor; survivor
        // backward to its own occurrence only.
        for &seq in group {
            fragment.link_forward(seq, survivor.seq());
        }
        fragment.link_backward(survivor.seq(), origin_seq);
    }

    Ok(fragment)
}

fn malformed(stage: StageId, call: &PipelineCall, reason: &str) -> TraceError {
    TraceError::MalformedTraceShape {
        stage,
        operation: call.name().to_owned(),
        reason: reason.to_owned(),
    }
}
