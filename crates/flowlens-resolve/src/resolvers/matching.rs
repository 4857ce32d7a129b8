//! Resolver family for short-circuiting match terminals.
//!
//! A match terminal tests a predicate against elements until a decision is
//! reached and stops early. The instrumentation inserts a peek probe before
//! the short-circuiting predicate, so the stage's `before` set is every
//! element actually visited, and the [`MatchProbe`] records which of those
//! satisfied the probe predicate.
//!
//! The concrete operation supplies two decisions: whether the outcome was a
//! witness-found case, and which connection policy applies to that outcome:
//!
//! - connect-filtered: the result is explained by the elements the probe
//!   filtered in (a positive witness fired);
//! - connect-difference: the result is explained by the visited elements the
//!   probe did *not* filter in (a negative/exhaustive verdict).
//!
//! Elements outside the connected set are not part of the causal explanation
//! and map forward to the empty sequence.

use flowlens_core::{AuxTrace, MatchProbe, PipelineCall, StageId, StageTrace, TraceError};

use crate::fragment::LineageFragment;
use crate::registry::MatchKind;

/// Which visited elements a match verdict is linked back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPolicy {
    /// Link the probe-satisfying elements.
    Filtered,
    /// Link the visited-minus-satisfying elements.
    Difference,
}

impl MatchKind {
    /// Whether the run's outcome was witnessed by a positive probe match.
    ///
    /// The instrumentation arranges the probe predicate so that a satisfying
    /// element IS the decisive witness for each kind: `anyMatch`/`noneMatch`
    /// probe the user predicate (a match decides `true`/`false`
    /// respectively), `allMatch` probes the negated predicate (its witness
    /// is a violator), and the finders stop at their first match.
    pub fn witness_found(self, probe: &MatchProbe) -> bool {
        !probe.satisfied().is_empty()
    }

    /// Connection policy for the given outcome.
    pub fn policy(self, witness_found: bool) -> ConnectPolicy {
        match self {
            MatchKind::Any | MatchKind::All | MatchKind::NoneOf | MatchKind::Find => {
                // A found witness explains the verdict by itself; an
                // exhaustive verdict is explained by everything the probe
                // rejected along the way.
                if witness_found {
                    ConnectPolicy::Filtered
                } else {
                    ConnectPolicy::Difference
                }
            }
        }
    }
}

pub fn resolve(
    stage: StageId,
    call: &PipelineCall,
    trace: &StageTrace,
    kind: MatchKind,
) -> Result<LineageFragment, TraceError> {
    let AuxTrace::Match(probe) = trace.aux() else {
        return Err(malformed(stage, call, "match probe payload missing"));
    };
    let after = trace.sorted_after();
    let [result] = after.as_slice() else {
        return Err(malformed(
            stage,
            call,
            &format!("match terminal must trace exactly one result element, got {}", after.len()),
        ));
    };

    let policy = kind.policy(kind.witness_found(probe));
    let mut fragment = LineageFragment::seeded(trace);
    for element in trace.sorted_before() {
        let connected = match policy {
            ConnectPolicy::Filtered => probe.is_satisfied(element.seq()),
            ConnectPolicy::Difference => !probe.is_satisfied(element.seq()),
        };
        if connected {
            fragment.link(element.seq(), result.seq());
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use flowlens_core::{CallRole, SeqId, SessionClock, TraceElement, ValueHandle};

    fn call(name: &str) -> PipelineCall {
        PipelineCall::new(CallRole::Terminator, name, "x -> x > 3", "int", "boolean")
    }

    fn make(clock: &SessionClock, seq: u32) -> TraceElement {
        TraceElement::new(SeqId(seq), ValueHandle::capture(clock, seq as u64, seq as u64, "v"))
    }

    fn match_trace(clock: &SessionClock, visited: &[u32], satisfied: &[u32], verdict: &str) -> StageTrace {
        let mut probe = MatchProbe::new();
        for &seq in satisfied {
            probe.record_satisfied(SeqId(seq));
        }
        let result = TraceElement::result(ValueHandle::capture(clock, 999, 999, verdict));
        StageTrace::new(visited.iter().map(|&s| make(clock, s)), [result])
            .with_aux(AuxTrace::Match(probe))
    }

    #[test]
    fn existential_found_connects_only_the_witness() {
        let clock = SessionClock::new();
        // Visited [1,5]; 5 satisfied `> 3` and short-circuited; 9 never visited.
        let trace = match_trace(&clock, &[1, 5], &[5], "true");
        let fragment = resolve(StageId(1), &call("anyMatch"), &trace, MatchKind::Any).unwrap();
        assert_eq!(fragment.backward_of(SeqId::RESULT), &[SeqId(5)]);
        assert!(fragment.forward_of(SeqId(1)).is_empty());
        assert_eq!(fragment.forward_of(SeqId(5)), &[SeqId::RESULT]);
    }

    #[test]
    fn existential_not_found_connects_everything_visited() {
        let clock = SessionClock::new();
        let trace = match_trace(&clock, &[1, 2, 3], &[], "false");
        let fragment = resolve(StageId(1), &call("anyMatch"), &trace, MatchKind::Any).unwrap();
        assert_eq!(
            fragment.backward_of(SeqId::RESULT),
            &[SeqId(1), SeqId(2), SeqId(3)]
        );
        for seq in [1, 2, 3] {
            assert_eq!(fragment.forward_of(SeqId(seq)), &[SeqId::RESULT]);
        }
    }

    #[test]
    fn universal_violation_connects_the_violator() {
        let clock = SessionClock::new();
        // allMatch probes the negated predicate: element 2 violated and
        // short-circuited the verdict to false.
        let trace = match_trace(&clock, &[1, 2], &[2], "false");
        let fragment = resolve(StageId(1), &call("allMatch"), &trace, MatchKind::All).unwrap();
        assert_eq!(fragment.backward_of(SeqId::RESULT), &[SeqId(2)]);
        assert!(fragment.forward_of(SeqId(1)).is_empty());
    }

    #[test]
    fn universal_exhaustive_true_connects_all_visited() {
        let clock = SessionClock::new();
        let trace = match_trace(&clock, &[1, 2], &[], "true");
        let fragment = resolve(StageId(1), &call("allMatch"), &trace, MatchKind::All).unwrap();
        assert_eq!(fragment.backward_of(SeqId::RESULT), &[SeqId(1), SeqId(2)]);
    }

    #[test]
    fn missing_probe_is_malformed() {
        let clock = SessionClock::new();
        let result = TraceElement::result(ValueHandle::capture(&clock, 9, 9, "true"));
        let trace = StageTrace::new([make(&clock, 1)], [result]);
        let err = resolve(StageId(4), &call("anyMatch"), &trace, MatchKind::Any).unwrap_err();
        assert!(matches!(err, TraceError::MalformedTraceShape { stage: StageId(4), .. }));
    }
}
