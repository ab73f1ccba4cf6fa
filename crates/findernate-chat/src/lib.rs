//! # findernate-chat
//!
//! Client-side chat bookkeeping: the optimistic pending-message queue, the
//! reconciliation of server echoes against it, and the pure functions that
//! derive unread / request counters and display fallbacks from conversation
//! listings.
//!
//! Everything here is synchronous and free of I/O. Owners that share a
//! [`MessageQueue`] across tasks wrap it in `Arc<Mutex<_>>`.

pub mod aggregator;
pub mod display;
pub mod queue;
pub mod reconcile;
pub mod time_format;

mod error;

pub use aggregator::{calculate_unread_counts, is_incoming_request, DerivedCounts, UnreadCounts};
pub use display::{chat_avatar, chat_display_name, other_participant};
pub use error::QueueError;
pub use queue::{MessageQueue, PendingMessage};
pub use reconcile::{reconcile, Reconciliation};
pub use time_format::format_chat_timestamp;
