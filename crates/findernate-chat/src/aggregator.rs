//! Unread and request counters derived from conversation listings.

use serde::{Deserialize, Serialize};

use findernate_shared::{ConversationKind, ConversationSummary, UserId};

/// Unread totals split by conversation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCounts {
    pub direct_unread_count: u32,
    pub group_unread_count: u32,
}

/// Badge counters shown by the UI, recomputed from scratch on every fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedCounts {
    pub direct_unread_count: u32,
    pub group_unread_count: u32,
    pub request_count: u32,
    pub total_count: u32,
}

impl DerivedCounts {
    pub fn new(unread: UnreadCounts, request_count: u32) -> Self {
        Self {
            direct_unread_count: unread.direct_unread_count,
            group_unread_count: unread.group_unread_count,
            request_count,
            total_count: unread
                .direct_unread_count
                .saturating_add(unread.group_unread_count)
                .saturating_add(request_count),
        }
    }

    /// All counters at zero.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Sum unread messages of direct and group conversations separately.
///
/// Conversations without an unread count contribute nothing.
pub fn calculate_unread_counts(conversations: &[ConversationSummary]) -> UnreadCounts {
    conversations
        .iter()
        .fold(UnreadCounts::default(), |mut acc, conversation| {
            let unread = conversation.unread_count.unwrap_or(0);
            match conversation.kind {
                ConversationKind::Direct => {
                    acc.direct_unread_count = acc.direct_unread_count.saturating_add(unread)
                }
                ConversationKind::Group => {
                    acc.group_unread_count = acc.group_unread_count.saturating_add(unread)
                }
            }
            acc
        })
}

/// Whether `conversation` is a message request started by someone else that
/// awaits the current user's decision.
///
/// Checks run in order and the first failing one decides: direct kind,
/// exactly two participants with ids, current user among them, not created
/// by the current user, other participant present.
pub fn is_incoming_request(conversation: &ConversationSummary, current_user_id: &UserId) -> bool {
    if conversation.kind != ConversationKind::Direct {
        return false;
    }

    let participants: Vec<&UserId> = conversation.valid_participants().map(|(id, _)| id).collect();
    if participants.len() != 2 {
        return false;
    }

    if !participants.contains(&current_user_id) {
        return false;
    }

    // Outgoing requests are hidden from the requests inbox.
    if conversation.created_by.as_ref() == Some(current_user_id) {
        return false;
    }

    participants.iter().any(|id| *id != current_user_id)
}
