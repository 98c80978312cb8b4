//! Progress reporting contract exposed by every phase (§6).

use serde::{Deserialize, Serialize};

/// Emitted at phase start, on each item completion, and once more at phase
/// end with a summary message. Embedding binaries forward this over
/// whatever transport they use; this crate has no opinion on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub completed: usize,
    pub total: usize,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(completed: usize, total: usize, message: impl Into<String>) -> Self {
        Self { completed, total, message: message.into() }
    }
}

/// A callback invoked by every phase driver. Boxed so phase drivers don't
/// need to be generic over the callback type.
pub type ProgressCallback = std::sync::Arc<dyn Fn(ProgressEvent) + Send + Sync>;
