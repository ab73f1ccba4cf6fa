use async_trait::async_trait;

use findernate_shared::ConversationSummary;

use crate::error::ApiError;

/// Backend collaborator listing the current user's conversations.
///
/// Both calls must be safe to repeat; the counts controller invokes them on
/// every refresh.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    /// All conversations of the signed-in user.
    async fn fetch_conversation_list(&self) -> Result<Vec<ConversationSummary>, ApiError>;

    /// Conversations waiting for the user to accept a message request.
    async fn fetch_pending_request_list(&self) -> Result<Vec<ConversationSummary>, ApiError>;
}

#[async_trait]
impl<T: ConversationSource + ?Sized> ConversationSource for std::sync::Arc<T> {
    async fn fetch_conversation_list(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        (**self).fetch_conversation_list().await
    }

    async fn fetch_pending_request_list(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        (**self).fetch_pending_request_list().await
    }
}
