#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use findernate_api::{ApiError, ConversationSource};
use findernate_client::CountsState;
use findernate_shared::{
    ConversationId, ConversationKind, ConversationSummary, CurrentUser, Participant, UserId,
};

/// Conversation source answering from canned data.
#[derive(Default)]
pub struct ScriptedSource {
    conversations: Mutex<Vec<ConversationSummary>>,
    requests: Mutex<Vec<ConversationSummary>>,
    /// One-shot answers for the next conversation-list calls, with latency.
    delayed: Mutex<VecDeque<(Duration, Vec<ConversationSummary>)>>,
    fail: AtomicBool,
    fail_requests: AtomicBool,
    list_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(
        conversations: Vec<ConversationSummary>,
        requests: Vec<ConversationSummary>,
    ) -> Self {
        Self {
            conversations: Mutex::new(conversations),
            requests: Mutex::new(requests),
            ..Self::default()
        }
    }

    pub fn set_conversations(&self, conversations: Vec<ConversationSummary>) {
        *self.conversations.lock().unwrap() = conversations;
    }

    pub fn push_delayed(&self, delay: Duration, conversations: Vec<ConversationSummary>) {
        self.delayed.lock().unwrap().push_back((delay, conversations));
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_requests_failing(&self, fail: bool) {
        self.fail_requests.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationSource for ScriptedSource {
    async fn fetch_conversation_list(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let delayed = self.delayed.lock().unwrap().pop_front();
        if let Some((delay, conversations)) = delayed {
            tokio::time::sleep(delay).await;
            return Ok(conversations);
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected("backend unavailable".into()));
        }
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn fetch_pending_request_list(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected("requests unavailable".into()));
        }
        Ok(self.requests.lock().unwrap().clone())
    }
}

pub fn user(id: &str) -> CurrentUser {
    CurrentUser {
        id: UserId::new(id),
        username: id.to_string(),
        full_name: None,
        profile_image_url: None,
    }
}

pub fn conversation(id: &str, kind: ConversationKind, unread: u32) -> ConversationSummary {
    ConversationSummary {
        id: ConversationId::new(id),
        kind,
        unread_count: Some(unread),
        participants: vec![Participant::new("me"), Participant::new("other")],
        created_by: Some(UserId::new("other")),
        group_name: None,
        group_image: None,
    }
}

/// Wait until the controller state satisfies `pred`.
pub async fn wait_for<F>(rx: &mut watch::Receiver<CountsState>, pred: F) -> CountsState
where
    F: Fn(&CountsState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let state = *rx.borrow_and_update();
            if pred(&state) {
                return state;
            }
            rx.changed().await.expect("controller dropped");
        }
    })
    .await
    .expect("timed out waiting for counts")
}
