//! # findernate-shared
//!
//! Identifiers, conversation shapes and constants shared by every FinderNate
//! client crate. Nothing in here performs I/O.

pub mod constants;
pub mod types;

pub use types::{
    ConversationId, ConversationKind, ConversationSummary, CurrentUser, Participant,
    ServerMessage, TemporaryId, UserId,
};
