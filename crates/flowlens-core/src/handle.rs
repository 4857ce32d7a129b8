//! Epoch-guarded value handles into the paused target process.
//!
//! A [`ValueHandle`] is a borrowed reference to a value that exists only
//! while the debuggee stays suspended. Instead of dereferencing a freed
//! mirror after the target resumes, every live access goes through the
//! [`SessionClock`]: a handle carries the [`RunEpoch`] it was captured in,
//! resuming the target bumps the clock, and any access with a mismatched
//! epoch fails with [`TraceError::StaleValueReference`].
//!
//! Two comparison functions are exposed and kept deliberately distinct:
//! [`ValueHandle::same_object`] (reference identity, used for dedup survivor
//! detection) and [`ValueHandle::same_value`] (value equality, used for
//! filter matching). Neither is wired into `PartialEq`, so the two semantics
//! cannot be collapsed by accident.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// Run-state generation counter of a debug session. Bumped every time the
/// target process resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunEpoch(pub u64);

impl fmt::Display for RunEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared clock tracking the current [`RunEpoch`] of a debug session.
///
/// Cloning shares the underlying counter, so every handle captured from one
/// session observes the same resume events.
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    epoch: Arc<AtomicU64>,
}

impl SessionClock {
    /// A fresh clock at epoch 0 (target suspended, first stop).
    pub fn new() -> Self {
        Self::default()
    }

    /// The current run epoch.
    pub fn current(&self) -> RunEpoch {
        RunEpoch(self.epoch.load(Ordering::Acquire))
    }

    /// Records a resume of the target process, invalidating every handle
    /// captured before this call.
    pub fn resume(&self) -> RunEpoch {
        RunEpoch(self.epoch.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

/// Opaque, borrowed reference to a value in the paused target process.
///
/// The engine never owns the referenced value. `object_id` identifies the
/// live object (reference identity); `value_key` is a value-equality
/// fingerprint computed by the instrumentation while the target was paused;
/// `preview` is a display string captured at the same moment and therefore
/// safe to keep after resumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueHandle {
    object_id: u64,
    value_key: u64,
    preview: String,
    epoch: RunEpoch,
}

impl ValueHandle {
    /// Captures a handle in the clock's current epoch.
    pub fn capture(clock: &SessionClock, object_id: u64, value_key: u64, preview: &str) -> Self {
        ValueHandle {
            object_id,
            value_key,
            preview: preview.to_owned(),
            epoch: clock.current(),
        }
    }

    /// A handle standing in for "no value" (void terminal results).
    pub fn void(clock: &SessionClock) -> Self {
        ValueHandle::capture(clock, 0, 0, "<void>")
    }

    /// The epoch this handle was captured in.
    pub fn epoch(&self) -> RunEpoch {
        self.epoch
    }

    /// Display string captured while the target was paused. Always valid.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Reference identity against another handle. Fails if either handle is
    /// stale: identity of a freed object is meaningless.
    pub fn same_object(&self, other: &ValueHandle, clock: &SessionClock) -> Result<bool, TraceError> {
        self.check_live(clock)?;
        other.check_live(clock)?;
        Ok(self.object_id == other.object_id)
    }

    /// Value equality against another handle, via the captured fingerprints.
    /// Fails if either handle is stale.
    pub fn same_value(&self, other: &ValueHandle, clock: &SessionClock) -> Result<bool, TraceError> {
        self.check_live(clock)?;
        other.check_live(clock)?;
        Ok(self.value_key == other.value_key)
    }

    fn check_live(&self, clock: &SessionClock) -> Result<(), TraceError> {
        let current = clock.current();
        if self.epoch != current {
            return Err(TraceError::StaleValueReference {
                captured: self.epoch,
                current,
            });
        }
        Ok(())
    }
}
