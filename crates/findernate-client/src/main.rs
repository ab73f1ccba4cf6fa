//! # findernate-client
//!
//! Headless runner for the chat client runtime. Restores the stored session,
//! keeps the unread / request counters live and logs every client event
//! until interrupted.

use tokio::sync::broadcast;
use tracing::{info, warn};

use findernate_client::{init_tracing, AppEvent, ClientConfig, ClientState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting FinderNate client v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let state = ClientState::open(config)?;
    match state.session().current_user() {
        Some(user) => info!(user = %user.id, "Session restored"),
        None => info!("No stored session; counters stay at zero until sign-in"),
    }

    let mut events = state.bus().subscribe();
    let tasks = state.start()?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(AppEvent::UnreadChanged(counts)) => info!(
                    direct = counts.direct_unread_count,
                    group = counts.group_unread_count,
                    requests = counts.request_count,
                    total = counts.total_count,
                    "Unread counters changed"
                ),
                Ok(event) => info!(event = event.name(), "Client event"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event log fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    tasks.shutdown().await;
    Ok(())
}
