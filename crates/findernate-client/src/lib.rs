//! # findernate-client
//!
//! Chat client runtime: session and auth guard, optimistic message
//! bookkeeping, live unread / request counters, and the event bus tying them
//! together. Hosts construct a [`ClientState`], call [`ClientState::start`]
//! and shut the returned tasks down when the chat surface goes away.

pub mod config;
pub mod counts;
pub mod events;
pub mod session;
pub mod state;
pub mod sweeper;
pub mod task;

mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use counts::{CountsState, MessageCountsController};
pub use error::ClientError;
pub use events::{AppEvent, EventBus, RemoteTransport, StoreTransport};
pub use session::Session;
pub use state::{ClientState, RunningTasks};
pub use task::BackgroundTask;

/// Install the global tracing subscriber (respects `RUST_LOG`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("findernate_client=debug,findernate_chat=info,findernate_api=info,findernate_store=info,warn")
    });

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    tracing::debug!("Tracing initialised");
}
