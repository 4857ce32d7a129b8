pub mod call;
pub mod element;
pub mod error;
pub mod handle;
pub mod id;
pub mod trace;

// Re-export commonly used types
pub use call::{CallRole, PipelineCall};
pub use element::TraceElement;
pub use error::TraceError;
pub use handle::{RunEpoch, SessionClock, ValueHandle};
pub use id::{SeqId, StageId};
pub use trace::{AuxTrace, MatchProbe, OccurrenceIndex, StageTrace, TerminalValue};
