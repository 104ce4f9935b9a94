//! Progress events emitted while waiting on a long-running operation
//!
//! The CLI turns these into spinner updates; library callers usually pass
//! `None`.

use crate::operation::OperationState;
use std::time::Duration;

/// Progress events emitted during a wait
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Waiting has begun
    Started { tracking_id: String },
    /// A poll returned
    Polling {
        tracking_id: String,
        attempt: u32,
        status: OperationState,
        elapsed: Duration,
    },
    /// Operation succeeded
    Completed { tracking_id: String },
    /// Operation reached the Failed state
    Failed { tracking_id: String, error: String },
    /// Attempt budget ran out
    TimedOut { tracking_id: String, attempts: u32 },
}

/// Callback type for progress updates
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Helper to emit progress events
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
