use thiserror::Error;

use findernate_shared::TemporaryId;

/// Errors produced by the pending-message queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// An entry with this temporary id is already pending.
    #[error("Pending message already queued: {0}")]
    DuplicateId(TemporaryId),
}
