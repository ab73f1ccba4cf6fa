//! Pending optimistic messages.
//!
//! Every message the user sends is rendered immediately and recorded here
//! until the backend's authoritative copy arrives. The backend acknowledges
//! sends of one conversation in send order, so reconciliation always pairs an
//! echo with the *oldest* pending entry of that conversation. Entries of
//! different conversations may interleave freely in the underlying sequence.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use findernate_shared::constants::PENDING_MESSAGE_TTL_SECS;
use findernate_shared::{ConversationId, TemporaryId};

use crate::error::QueueError;

/// One optimistically rendered, not yet acknowledged outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMessage {
    /// Client-generated id correlating the UI render with this entry.
    pub temporary_id: TemporaryId,
    /// Conversation the message was sent to.
    pub conversation_id: ConversationId,
    /// Message body at the time of sending.
    pub content: String,
    /// Client timestamp of insertion.
    pub sent_at: DateTime<Utc>,
}

impl PendingMessage {
    /// Insertion time as Unix epoch milliseconds.
    pub fn sent_at_millis(&self) -> i64 {
        self.sent_at.timestamp_millis()
    }
}

/// FIFO registry of pending messages, keyed by conversation.
#[derive(Debug, Clone)]
pub struct MessageQueue {
    /// Insertion order across all conversations.
    entries: Vec<PendingMessage>,
    ttl: Duration,
}

impl MessageQueue {
    /// Create an empty queue with the default two-minute staleness threshold.
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(PENDING_MESSAGE_TTL_SECS))
    }

    /// Create an empty queue that sweeps entries older than `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Vec::new(),
            ttl,
        }
    }

    /// Record a message that was just rendered optimistically.
    ///
    /// Fails with [`QueueError::DuplicateId`] if `temporary_id` is already
    /// pending; the existing entry is left untouched.
    pub fn add(
        &mut self,
        temporary_id: TemporaryId,
        conversation_id: ConversationId,
        content: impl Into<String>,
    ) -> Result<&PendingMessage, QueueError> {
        self.add_at(temporary_id, conversation_id, content, Utc::now())
    }

    /// Same as [`MessageQueue::add`] with an explicit insertion time.
    pub fn add_at(
        &mut self,
        temporary_id: TemporaryId,
        conversation_id: ConversationId,
        content: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Result<&PendingMessage, QueueError> {
        if self.entries.iter().any(|e| e.temporary_id == temporary_id) {
            return Err(QueueError::DuplicateId(temporary_id));
        }

        debug!(
            temp_id = %temporary_id,
            conversation = %conversation_id,
            "Queued pending message"
        );

        self.entries.push(PendingMessage {
            temporary_id,
            conversation_id,
            content: content.into(),
            sent_at,
        });

        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    /// Remove and return the oldest pending entry of a conversation.
    pub fn dequeue_for_chat(&mut self, conversation_id: &ConversationId) -> Option<PendingMessage> {
        let index = self.position_for_chat(conversation_id)?;
        Some(self.entries.remove(index))
    }

    /// Return the oldest pending entry of a conversation without consuming it.
    pub fn peek_for_chat(&self, conversation_id: &ConversationId) -> Option<&PendingMessage> {
        self.position_for_chat(conversation_id)
            .map(|index| &self.entries[index])
    }

    /// Retract a specific entry, e.g. after its send failed.
    ///
    /// Returns `true` if an entry was found and removed.
    pub fn remove(&mut self, temporary_id: &TemporaryId) -> bool {
        match self
            .entries
            .iter()
            .position(|e| &e.temporary_id == temporary_id)
        {
            Some(index) => {
                self.entries.remove(index);
                debug!(temp_id = %temporary_id, "Removed pending message");
                true
            }
            None => false,
        }
    }

    /// All pending entries of a conversation, oldest first.
    pub fn get_pending_for_chat(&self, conversation_id: &ConversationId) -> Vec<&PendingMessage> {
        self.entries
            .iter()
            .filter(|e| &e.conversation_id == conversation_id)
            .collect()
    }

    /// Drop every entry older than the staleness threshold.
    ///
    /// The evicted entries are returned so the owner can tell the UI that
    /// those sends timed out.
    pub fn cleanup(&mut self) -> Vec<PendingMessage> {
        self.cleanup_at(Utc::now())
    }

    /// Same as [`MessageQueue::cleanup`] evaluated at `now`.
    pub fn cleanup_at(&mut self, now: DateTime<Utc>) -> Vec<PendingMessage> {
        let ttl = chrono::Duration::milliseconds(self.ttl.as_millis() as i64);

        let (stale, fresh): (Vec<_>, Vec<_>) = self
            .entries
            .drain(..)
            .partition(|e| now.signed_duration_since(e.sent_at) > ttl);
        self.entries = fresh;

        if !stale.is_empty() {
            debug!(
                evicted = stale.len(),
                remaining = self.entries.len(),
                "Swept stale pending messages"
            );
        }

        stale
    }

    /// Discard every pending entry of a conversation (closed or left).
    ///
    /// Returns the number of entries dropped.
    pub fn clear_chat(&mut self, conversation_id: &ConversationId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| &e.conversation_id != conversation_id);
        before - self.entries.len()
    }

    /// Number of pending entries across all conversations.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Staleness threshold applied by [`MessageQueue::cleanup`].
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn position_for_chat(&self, conversation_id: &ConversationId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| &e.conversation_id == conversation_id)
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}
