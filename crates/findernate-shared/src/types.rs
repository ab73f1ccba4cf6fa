use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// Backend identifiers are opaque strings (Mongo object ids in practice).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-generated id of an optimistically rendered message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TemporaryId(pub String);

impl TemporaryId {
    pub fn new() -> Self {
        Self(format!("temp-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TemporaryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TemporaryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for TemporaryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Direct,
    Group,
}

// ---------------------------------------------------------------------------
// Conversation shapes returned by the REST backend
// ---------------------------------------------------------------------------

/// Participant stub embedded in a conversation listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(rename = "_id", default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(UserId::new(id)),
            ..Self::default()
        }
    }
}

/// Minimal conversation fields the unread aggregator and display helpers need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(rename = "_id")]
    pub id: ConversationId,
    #[serde(rename = "chatType")]
    pub kind: ConversationKind,
    /// Missing on some listings; treated as zero.
    #[serde(default)]
    pub unread_count: Option<u32>,
    /// Either populated stubs or bare user ids, depending on the endpoint.
    #[serde(default, deserialize_with = "deserialize_participants")]
    pub participants: Vec<Participant>,
    #[serde(default, deserialize_with = "deserialize_user_ref")]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub group_image: Option<String>,
}

impl ConversationSummary {
    /// Participants that carry an identifier.
    pub fn valid_participants(&self) -> impl Iterator<Item = (&UserId, &Participant)> {
        self.participants
            .iter()
            .filter_map(|p| p.id.as_ref().map(|id| (id, p)))
    }
}

/// Authenticated user of this client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// Authoritative chat message as delivered by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "chatId")]
    pub conversation_id: ConversationId,
    #[serde(deserialize_with = "deserialize_required_user_ref")]
    pub sender: UserId,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// User references: either a bare id or a populated user object
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum UserRef {
    Id(UserId),
    Populated {
        #[serde(rename = "_id")]
        id: Option<UserId>,
    },
}

impl UserRef {
    fn into_id(self) -> Option<UserId> {
        match self {
            UserRef::Id(id) => Some(id),
            UserRef::Populated { id } => id,
        }
    }
}

fn deserialize_user_ref<'de, D>(deserializer: D) -> Result<Option<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<UserRef> = Option::deserialize(deserializer)?;
    Ok(value.and_then(UserRef::into_id))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParticipantRef {
    Id(UserId),
    Stub(Participant),
}

fn deserialize_participants<'de, D>(deserializer: D) -> Result<Vec<Participant>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs: Option<Vec<ParticipantRef>> = Option::deserialize(deserializer)?;
    Ok(refs
        .unwrap_or_default()
        .into_iter()
        .map(|r| match r {
            ParticipantRef::Id(id) => Participant {
                id: Some(id),
                ..Participant::default()
            },
            ParticipantRef::Stub(stub) => stub,
        })
        .collect())
}

fn deserialize_required_user_ref<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    UserRef::deserialize(deserializer)?
        .into_id()
        .ok_or_else(|| serde::de::Error::custom("user reference without _id"))
}
