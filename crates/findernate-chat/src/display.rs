//! Name and avatar fallbacks for the chat list.

use findernate_shared::constants::{DEFAULT_AVATAR_URL, DEFAULT_GROUP_NAME, UNKNOWN_USER_NAME};
use findernate_shared::{ConversationKind, ConversationSummary, CurrentUser, Participant};

/// The participant of a direct conversation who is not `current_user`.
///
/// With no current user the first participant is returned.
pub fn other_participant<'a>(
    conversation: &'a ConversationSummary,
    current_user: Option<&CurrentUser>,
) -> Option<&'a Participant> {
    conversation.participants.iter().find(|p| match current_user {
        Some(user) => p.id.as_ref() != Some(&user.id),
        None => true,
    })
}

/// Title shown for a conversation.
pub fn chat_display_name(
    conversation: &ConversationSummary,
    current_user: Option<&CurrentUser>,
) -> String {
    match conversation.kind {
        ConversationKind::Group => non_empty(conversation.group_name.as_deref())
            .unwrap_or(DEFAULT_GROUP_NAME)
            .to_string(),
        ConversationKind::Direct => other_participant(conversation, current_user)
            .and_then(|p| {
                non_empty(p.full_name.as_deref()).or_else(|| non_empty(p.username.as_deref()))
            })
            .unwrap_or(UNKNOWN_USER_NAME)
            .to_string(),
    }
}

/// Avatar URL shown for a conversation.
pub fn chat_avatar(conversation: &ConversationSummary, current_user: Option<&CurrentUser>) -> String {
    let image = match conversation.kind {
        ConversationKind::Group => non_empty(conversation.group_image.as_deref()),
        ConversationKind::Direct => other_participant(conversation, current_user)
            .and_then(|p| non_empty(p.profile_image_url.as_deref())),
    };
    image.unwrap_or(DEFAULT_AVATAR_URL).to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
