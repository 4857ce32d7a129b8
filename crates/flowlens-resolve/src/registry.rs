//! Operation-name → resolver dispatch.
//!
//! A closed tagged-variant dispatch over the known resolver families,
//! replacing open-ended string lookup: [`ResolverKind::for_call`] is a total
//! function, and names absent from the table degrade gracefully to
//! [`ResolverKind::NoLineage`] rather than failing, because an unrecognized
//! but semantically transparent operation must not break the whole chain's
//! visualization. The mapping is read-only data; dispatch is safe to call
//! from concurrent resolutions.

use flowlens_core::{PipelineCall, SessionClock, StageId, StageTrace, TraceError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fragment::LineageFragment;
use crate::resolvers;

/// Concrete short-circuiting match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Existential quantifier (`anyMatch`).
    Any,
    /// Universal quantifier (`allMatch`), probed with the negated predicate.
    All,
    /// Negated existential (`noneMatch`).
    NoneOf,
    /// First/any-match finders (`findFirst`, `findAny`).
    Find,
}

/// The closed set of lineage-resolution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolverKind {
    /// Positional 1:1 correspondence for order-preserving transforms.
    PassThrough,
    /// Fallback: all keys present, no lineage computable.
    NoLineage,
    /// Value-equality matching for stages that may drop elements.
    Filter,
    /// Equivalence-class collapsing for deduplication stages.
    Distinct,
    /// Everything-contributed lineage for aggregating terminals.
    AllToResult,
    /// Short-circuiting match terminals.
    Match(MatchKind),
}

impl ResolverKind {
    /// Selects the resolver for a pipeline call. Total: unknown operation
    /// names fall back to [`ResolverKind::NoLineage`].
    pub fn for_call(call: &PipelineCall) -> ResolverKind {
        match call.name() {
            // Order-preserving 1:1 transforms only -- reordering operations
            // (e.g. sorted) must not be paired positionally and fall back.
            "map" | "mapToInt" | "mapToLong" | "mapToDouble" | "mapToObj" | "boxed"
            | "asLongStream" | "asDoubleStream" | "peek" => ResolverKind::PassThrough,
            "filter" | "limit" | "skip" | "takeWhile" | "dropWhile" => ResolverKind::Filter,
            "distinct" => ResolverKind::Distinct,
            "sum" | "average" | "count" | "reduce" | "collect" | "toArray" | "toList" | "min"
            | "max" | "forEach" | "forEachOrdered" => ResolverKind::AllToResult,
            "anyMatch" => ResolverKind::Match(MatchKind::Any),
            "allMatch" => ResolverKind::Match(MatchKind::All),
            "noneMatch" => ResolverKind::Match(MatchKind::NoneOf),
            "findFirst" | "findAny" => ResolverKind::Match(MatchKind::Find),
            name => {
                debug!(operation = name, "unknown operation, using no-lineage resolver");
                ResolverKind::NoLineage
            }
        }
    }

    /// Resolves one stage's trace into its local lineage fragment.
    pub fn resolve(
        self,
        stage: StageId,
        call: &PipelineCall,
        trace: &StageTrace,
        clock: &SessionClock,
    ) -> Result<LineageFragment, TraceError> {
        match self {
            ResolverKind::PassThrough => resolvers::pass_through::resolve(stage, call, trace),
            ResolverKind::NoLineage => Ok(resolvers::no_lineage::resolve(trace)),
            ResolverKind::Filter => resolvers::filter::resolve(stage, call, trace, clock),
            ResolverKind::Distinct => resolvers::distinct::resolve(stage, call, trace, clock),
            ResolverKind::AllToResult => resolvers::aggregate::resolve(stage, call, trace),
            ResolverKind::Match(kind) => resolvers::matching::resolve(stage, call, trace, kind),
        }
    }
}
