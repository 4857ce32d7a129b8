//! Trace Resolution Engine: turns raw per-stage before/after element
//! snapshots into a bidirectionally navigable lineage chain.
//!
//! The engine is a pure synchronous transform from (pipeline call
//! descriptors, stage traces, terminal value) to a [`ResolvedChain`]. Each
//! stage is resolved independently into a [`LineageFragment`] by the
//! resolver family its operation name selects; the stitcher then composes
//! adjacent fragments into one continuous chain, synthesizing a terminal
//! result element for the pipeline's returned value.

pub mod chain;
pub mod fragment;
pub mod registry;
pub mod resolvers;
pub mod stitch;

pub use chain::{Lineage, ResolvedChain, StageState};
pub use fragment::LineageFragment;
pub use registry::{MatchKind, ResolverKind};
pub use stitch::{ResolveConfig, TraceSnapshot};
