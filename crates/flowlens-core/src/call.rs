//! Pipeline call descriptors.
//!
//! A [`PipelineCall`] describes one stage of the traced pipeline expression
//! as discovered by the chain-building collaborator: its role, operation
//! name, argument text, and the declared element types at its boundaries.
//! The engine treats descriptors as opaque metadata except for the operation
//! name, which selects the resolver kind.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position-kind of a call within the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallRole {
    /// Source of the pipeline; its stage trace has an empty `before` set.
    Producer,
    /// Element-to-element operation between producer and terminator.
    Intermediate,
    /// Final operation; its stage trace has at most one `after` element.
    Terminator,
}

/// One stage of the pipeline expression, as seen in source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCall {
    role: CallRole,
    name: String,
    args: String,
    type_before: String,
    type_after: String,
}

impl PipelineCall {
    pub fn new(
        role: CallRole,
        name: impl Into<String>,
        args: impl Into<String>,
        type_before: impl Into<String>,
        type_after: impl Into<String>,
    ) -> Self {
        PipelineCall {
            role,
            name: name.into(),
            args: args.into(),
            type_before: type_before.into(),
            type_after: type_after.into(),
        }
    }

    pub fn role(&self) -> CallRole {
        self.role
    }

    /// Operation name, e.g. `filter` or `anyMatch`. Selects the resolver.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument text as written in source, e.g. `x -> x % 2 == 0`.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Declared element type entering this call.
    pub fn type_before(&self) -> &str {
        &self.type_before
    }

    /// Declared element type leaving this call.
    pub fn type_after(&self) -> &str {
        &self.type_after
    }
}

impl fmt::Display for PipelineCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_call_text() {
        let call = PipelineCall::new(
            CallRole::Intermediate,
            "filter",
            "x -> x % 2 == 0",
            "int",
            "int",
        );
        assert_eq!(format!("{call}"), "filter(x -> x % 2 == 0)");
        assert_eq!(call.role(), CallRole::Intermediate);
    }
}
