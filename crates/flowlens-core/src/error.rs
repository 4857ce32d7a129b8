//! Core error types for trace resolution.
//!
//! Uses `thiserror` for structured, matchable error variants. Structural
//! anomalies (length mismatch, malformed payload shape, stale handle) abort
//! the whole resolution; an unrecognized operation name is *not* an error --
//! the resolver registry absorbs it by falling back to the no-lineage
//! resolver, so no variant exists for it here.

use crate::handle::RunEpoch;
use crate::id::StageId;
use thiserror::Error;

/// Errors produced while resolving a trace into a lineage chain.
///
/// Every variant is fatal for the resolution that raised it: no partial
/// chain is returned, and the message identifies the offending stage or
/// handle so the caller can surface a single explanatory diagnostic.
#[derive(Debug, Clone, Error)]
pub enum TraceError {
    /// The stage-trace list and the call-descriptor list disagree in length.
    #[error("inconsistent trace length: pipeline has {calls} calls but {traces} stage traces")]
    InconsistentTraceLength { calls: usize, traces: usize },

    /// A stage's raw trace payload does not match the shape its resolver
    /// expects (missing occurrence index, missing match probe, wrong result
    /// arity, or a broken adjacency between neighboring stages).
    #[error("malformed trace for '{operation}' at stage {stage}: {reason}")]
    MalformedTraceShape {
        stage: StageId,
        operation: String,
        reason: String,
    },

    /// A value handle was accessed after the target process resumed. This is
    /// a timing issue, not a logic bug: the handle was captured in epoch
    /// `captured` but the session has since advanced to `current`.
    #[error(
        "stale value reference: handle captured in run epoch {captured} accessed in epoch {current}"
    )]
    StaleValueReference {
        captured: RunEpoch,
        current: RunEpoch,
    },
}
