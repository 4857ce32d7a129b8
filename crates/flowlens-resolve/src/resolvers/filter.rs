//! Resolver for predicate-style filtering operations.
//!
//! Applies when a stage may drop elements without reordering the survivors.
//! Every `after` element is matched 1:1, by value equality, to the earliest
//! unclaimed `before` element with an equal value. `before` elements no
//! survivor claims are dropped (empty forward mapping); every `after`
//! element ends up with a non-empty singleton backward mapping.

use flowlens_core::{PipelineCall, SessionClock, StageId, StageTrace, TraceError};

use crate::fragment::LineageFragment;

pub fn resolve(
    stage: StageId,
    call: &PipelineCall,
    trace: &StageTrace,
    clock: &SessionClock,
) -> Result<LineageFragment, TraceError> {
    let mut fragment = LineageFragment::seeded(trace);
    let before = trace.sorted_before();
    let mut claimed = vec![false; before.len()];

    for survivor in trace.sorted_after() {
        let mut origin = None;
        for (slot, candidate) in before.iter().enumerate() {
            if claimed[slot] {
                continue;
            }
            if survivor.handle().same_value(candidate.handle(), clock)? {
                origin = Some(slot);
                break;
            }
        }
        let slot = origin.ok_or_else(|| TraceError::MalformedTraceShape {
            stage,
            operation: call.name().to_owned(),
            reason: format!(
                "no unclaimed input with a value equal to surviving element {}",
                survivor.seq()
            ),
        })?;
        claimed[slot] = true;
        fragment.link(before[slot].seq(), survivor.seq());
    }

    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlens_core::{CallRole, SeqId, TraceElement, ValueHandle};

    fn call() -> PipelineCall {
        PipelineCall::new(CallRole::Intermediate, "filter", "x -> x % 2 == 0", "int", "int")
    }

    fn make(clock: &SessionClock, seq: u32, value: u64) -> TraceElement {
        TraceElement::new(
            SeqId(seq),
            ValueHandle::capture(clock, seq as u64 + 100, value, "v"),
        )
    }

    #[test]
    fn survivors_claim_equal_values_dropped_elements_map_to_nothing() {
        let clock = SessionClock::new();
        // Input [1,2,3,4], predicate "even": survivors carry values 2 and 4.
        let trace = StageTrace::new(
            [
                make(&clock, 1, 1),
                make(&clock, 2, 2),
                make(&clock, 3, 3),
                make(&clock, 4, 4),
            ],
            [make(&clock, 5, 2), make(&clock, 6, 4)],
        );
        let fragment = resolve(StageId(1), &call(), &trace, &clock).unwrap();
        assert!(fragment.forward_of(SeqId(1)).is_empty());
        assert_eq!(fragment.forward_of(SeqId(2)), &[SeqId(5)]);
        assert!(fragment.forward_of(SeqId(3)).is_empty());
        assert_eq!(fragment.forward_of(SeqId(4)), &[SeqId(6)]);
        assert_eq!(fragment.backward_of(SeqId(5)), &[SeqId(2)]);
        assert_eq!(fragment.backward_of(SeqId(6)), &[SeqId(4)]);
        assert!(fragment.is_total_for(&trace));
    }

    #[test]
    fn equal_values_claim_earliest_unclaimed_occurrence() {
        let clock = SessionClock::new();
        // Two equal survivors: the first claims the first occurrence, the
        // second the next unclaimed one.
        let trace = StageTrace::new(
            [make(&clock, 1, 7), make(&clock, 2, 7)],
            [make(&clock, 3, 7), make(&clock, 4, 7)],
        );
        let fragment = resolve(StageId(1), &call(), &trace, &clock).unwrap();
        assert_eq!(fragment.backward_of(SeqId(3)), &[SeqId(1)]);
        assert_eq!(fragment.backward_of(SeqId(4)), &[SeqId(2)]);
    }

    #[test]
    fn unmatched_survivor_is_malformed() {
        let clock = SessionClock::new();
        let trace = StageTrace::new([make(&clock, 1, 1)], [make(&clock, 2, 9)]);
        let err = resolve(StageId(3), &call(), &trace, &clock).unwrap_err();
        assert!(matches!(err, TraceError::MalformedTraceShape { stage: StageId(3), .. }));
    }

    #[test]
    fn stale_session_aborts_resolution() {
        let clock = SessionClock::new();
        let trace = StageTrace::new([make(&clock, 1, 1)], [make(&clock, 2, 1)]);
        clock.resume();
        let err = resolve(StageId(1), &call(), &trace, &clock).unwrap_err();
        assert!(matches!(err, TraceError::StaleValueReference { .. }));
    }
}
