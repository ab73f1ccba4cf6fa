//! # findernate-api
//!
//! Typed access to the FinderNate REST backend endpoints the chat client
//! consumes. The [`ConversationSource`] trait is the seam the counts
//! controller depends on; [`ApiClient`] is its `reqwest` implementation.

pub mod client;
pub mod envelope;
pub mod source;

mod error;

pub use client::{ApiClient, ApiConfig};
pub use error::ApiError;
pub use source::ConversationSource;
