//! Fallback resolver declaring "no lineage computable here".
//!
//! Used for operations whose element-level correspondence is not tracked:
//! unrecognized names, producers, and operations where only aggregate
//! behavior matters. Every `before` and `after` key is present but maps to
//! an empty sequence, so the totality invariant holds and downstream
//! consumers see dead ends rather than missing keys.

use flowlens_core::StageTrace;

use crate::fragment::LineageFragment;

pub fn resolve(trace: &StageTrace) -> LineageFragment {
    LineageFragment::seeded(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlens_core::{SeqId, SessionClock, TraceElement, ValueHandle};

    #[test]
    fn all_keys_present_all_neighbors_empty() {
        let clock = SessionClock::new();
        let make = |seq: u32| {
            TraceElement::new(SeqId(seq), ValueHandle::capture(&clock, 1, 1, "v"))
        };
        let trace = StageTrace::new([make(1), make(2)], [make(3)]);
        let fragment = resolve(&trace);
        assert!(fragment.is_total_for(&trace));
        assert!(fragment.forward_of(SeqId(1)).is_empty());
        assert!(fragment.forward_of(SeqId(2)).is_empty());
        assert!(fragment.backward_of(SeqId(3)).is_empty());
    }
}
