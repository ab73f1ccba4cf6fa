//! Pairing server echoes with optimistic renders.

use tracing::debug;

use findernate_shared::{ServerMessage, UserId};

use crate::queue::{MessageQueue, PendingMessage};

/// Outcome of feeding an authoritative message through the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Our own send was acknowledged; `pending` should be replaced by `message`.
    Confirmed {
        pending: PendingMessage,
        message: ServerMessage,
    },
    /// Sent by the current user but nothing was pending here (another device,
    /// or the entry was already swept).
    Unmatched(ServerMessage),
    /// Sent by somebody else.
    Incoming(ServerMessage),
}

/// Match `message` against the oldest pending entry of its conversation.
pub fn reconcile(
    queue: &mut MessageQueue,
    message: ServerMessage,
    current_user_id: &UserId,
) -> Reconciliation {
    if &message.sender != current_user_id {
        return Reconciliation::Incoming(message);
    }

    match queue.dequeue_for_chat(&message.conversation_id) {
        Some(pending) => {
            debug!(
                temp_id = %pending.temporary_id,
                message_id = %message.id,
                conversation = %message.conversation_id,
                "Reconciled optimistic message"
            );
            Reconciliation::Confirmed { pending, message }
        }
        None => Reconciliation::Unmatched(message),
    }
}
