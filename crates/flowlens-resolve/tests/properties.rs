//! Property suites for the resolution invariants: totality, adjacency
//! duality, and idempotence over generated pipelines.

use flowlens_core::{
    CallRole, PipelineCall, SeqId, SessionClock, StageTrace, TerminalValue, TraceElement,
    ValueHandle,
};
use flowlens_resolve::{LineageFragment, ResolverKind, TraceSnapshot};
use proptest::prelude::*;

fn call(role: CallRole, name: &str) -> PipelineCall {
    PipelineCall::new(role, name, "", "int", "int")
}

fn element(clock: &SessionClock, seq: u32, value: u64) -> TraceElement {
    TraceElement::new(
        SeqId(seq),
        ValueHandle::capture(clock, seq as u64 + 1_000, value, &value.to_string()),
    )
}

/// Builds a producer -> filter -> sum snapshot from input values and a keep
/// mask, honoring filter semantics (survivors keep input order and value).
fn filter_snapshot(clock: &SessionClock, values: &[u64], keep: &[bool]) -> TraceSnapshot {
    let mut seq = 0;
    let mut produced = Vec::new();
    let mut survivors = Vec::new();
    for (value, keep) in values.iter().zip(keep) {
        seq += 1;
        produced.push(element(clock, seq, *value));
        if *keep {
            seq += 1;
            survivors.push(element(clock, seq, *value));
        }
    }
    TraceSnapshot::new(
        vec![
            call(CallRole::Producer, "of"),
            call(CallRole::Intermediate, "filter"),
            call(CallRole::Terminator, "sum"),
        ],
        vec![
            StageTrace::new([], produced.clone()),
            StageTrace::new(produced, survivors.clone()),
            StageTrace::new(survivors, []),
        ],
        TerminalValue::Value(ValueHandle::capture(clock, 1, 0, "sum")),
        false,
        clock.clone(),
    )
}

fn assert_total(fragment: &LineageFragment, trace: &StageTrace) {
    assert!(
        fragment.is_total_for(trace),
        "fragment not total: {fragment:?} for {trace:?}"
    );
}

proptest! {
    /// Every resolver family keeps every before element a forward key and
    /// every after element a backward key.
    #[test]
    fn totality_holds_for_every_stage(
        values in prop::collection::vec(0u64..16, 0..12),
        mask in prop::collection::vec(any::<bool>(), 0..12),
    ) {
        let clock = SessionClock::new();
        let keep: Vec<bool> = values
            .iter()
            .zip(mask.iter().chain(std::iter::repeat(&false)))
            .map(|(_, k)| *k)
            .collect();
        let snapshot = filter_snapshot(&clock, &values, &keep);
        for (index, (call, trace)) in snapshot.calls().iter().zip(snapshot.traces()).enumerate() {
            // The untouched terminal trace has no result element yet; the
            // fragment-level invariant applies to the traced shape itself.
            let kind = ResolverKind::for_call(call);
            if kind == ResolverKind::AllToResult {
                continue;
            }
            let fragment = kind
                .resolve(flowlens_core::StageId(index as u32), call, trace, &clock)
                .unwrap();
            assert_total(&fragment, trace);
        }
    }

    /// A snapshot honoring adjacency duality resolves, and every surviving
    /// element is navigable backward to exactly one origin of equal value.
    #[test]
    fn filter_chains_resolve_and_navigate(
        values in prop::collection::vec(0u64..16, 1..12),
        mask in prop::collection::vec(any::<bool>(), 1..12),
    ) {
        let clock = SessionClock::new();
        let keep: Vec<bool> = values
            .iter()
            .zip(mask.iter().chain(std::iter::repeat(&true)))
            .map(|(_, k)| *k)
            .collect();
        let snapshot = filter_snapshot(&clock, &values, &keep);
        let chain = snapshot.resolve().unwrap();
        prop_assert_eq!(chain.len(), 3);

        let survivors: Vec<SeqId> = chain.states()[1].elements().map(|e| e.seq()).collect();
        for seq in survivors {
            let origins = chain.neighbors_before(1, seq);
            prop_assert_eq!(origins.len(), 1);
        }
        // Dropped producer elements have no forward image.
        let dropped = values.iter().zip(&keep).filter(|(_, k)| !**k).count();
        let dead_ends = chain.states()[0]
            .elements()
            .filter(|e| chain.neighbors_after(0, e.seq()).is_empty())
            .count();
        prop_assert_eq!(dead_ends, dropped);
    }

    /// Resolving the same immutable snapshot twice yields structurally equal
    /// chains.
    #[test]
    fn resolution_is_idempotent(
        values in prop::collection::vec(0u64..16, 1..10),
    ) {
        let clock = SessionClock::new();
        let keep = vec![true; values.len()];
        let snapshot = filter_snapshot(&clock, &values, &keep);
        let first = snapshot.resolve().unwrap();
        let second = snapshot.resolve().unwrap();

        prop_assert_eq!(first.len(), second.len());
        for stage in 0..first.len() {
            let a: Vec<SeqId> = first.states()[stage].elements().map(|e| e.seq()).collect();
            let b: Vec<SeqId> = second.states()[stage].elements().map(|e| e.seq()).collect();
            prop_assert_eq!(a.clone(), b);
            for seq in a {
                let before_a: Vec<SeqId> =
                    first.neighbors_before(stage, seq).iter().map(|e| e.seq()).collect();
                let before_b: Vec<SeqId> =
                    second.neighbors_before(stage, seq).iter().map(|e| e.seq()).collect();
                prop_assert_eq!(before_a, before_b);
                let after_a: Vec<SeqId> =
                    first.neighbors_after(stage, seq).iter().map(|e| e.seq()).collect();
                let after_b: Vec<SeqId> =
                    second.neighbors_after(stage, seq).iter().map(|e| e.seq()).collect();
                prop_assert_eq!(after_a, after_b);
            }
        }
    }
}
