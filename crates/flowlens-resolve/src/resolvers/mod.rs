//! The per-stage resolver families.
//!
//! Each module implements one lineage-resolution strategy as a pure function
//! from a [`flowlens_core::StageTrace`] (plus session clock, where live
//! value comparison is involved) to a [`crate::LineageFragment`]. Dispatch
//! between families is the closed [`crate::ResolverKind`] enum.

pub mod aggregate;
pub mod distinct;
pub mod filter;
pub mod matching;
pub mod no_lineage;
pub mod pass_through;
