//! Live unread / request counters.
//!
//! The controller fetches both conversation listings, derives the badge
//! counters and publishes them through a `watch` channel. It refreshes on
//! activation, on a slow timer, on `refresh-message-counts` events and when
//! the signed-in user changes. Fetch failures degrade to all-zero counters;
//! they are logged, never returned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use findernate_api::ConversationSource;
use findernate_chat::{calculate_unread_counts, DerivedCounts};
use findernate_shared::CurrentUser;

use crate::events::{AppEvent, EventBus};
use crate::task::BackgroundTask;

/// Observable controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsState {
    pub counts: DerivedCounts,
    /// True only while a fetch is in flight.
    pub loading: bool,
}

pub struct MessageCountsController<S> {
    source: S,
    user_rx: watch::Receiver<Option<CurrentUser>>,
    state_tx: watch::Sender<CountsState>,
    /// Bumped by every refresh; results of older refreshes are dropped.
    generation: AtomicU64,
    bus: EventBus,
}

impl<S: ConversationSource + 'static> MessageCountsController<S> {
    pub fn new(
        source: S,
        user_rx: watch::Receiver<Option<CurrentUser>>,
        bus: EventBus,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(CountsState::default());
        Arc::new(Self {
            source,
            user_rx,
            state_tx,
            generation: AtomicU64::new(0),
            bus,
        })
    }

    /// Current counters and loading flag.
    pub fn snapshot(&self) -> CountsState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<CountsState> {
        self.state_tx.subscribe()
    }

    /// Refresh the counters now.
    ///
    /// Without a signed-in user the counters drop to zero and no request is
    /// made. If another refresh starts before this one completes, this one's
    /// result is discarded.
    pub async fn refetch(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let user_id = self.user_rx.borrow().as_ref().map(|u| u.id.clone());
        let Some(user_id) = user_id else {
            debug!("No signed-in user, clearing message counts");
            self.publish(CountsState::default());
            return;
        };

        self.state_tx.send_modify(|state| state.loading = true);
        let mut in_flight = InFlight {
            state_tx: &self.state_tx,
            generation: &self.generation,
            mine: generation,
            armed: true,
        };

        let (conversations, requests) = tokio::join!(
            self.source.fetch_conversation_list(),
            self.source.fetch_pending_request_list(),
        );

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding superseded counts refresh");
            return;
        }
        in_flight.armed = false;

        let counts = match (conversations, requests) {
            (Ok(conversations), Ok(requests)) => DerivedCounts::new(
                calculate_unread_counts(&conversations),
                u32::try_from(requests.len()).unwrap_or(u32::MAX),
            ),
            (Err(e), _) | (_, Err(e)) => {
                warn!(
                    user = %user_id,
                    transient = e.is_transient(),
                    error = %e,
                    "Failed to fetch message counts"
                );
                DerivedCounts::zero()
            }
        };

        debug!(
            user = %user_id,
            direct = counts.direct_unread_count,
            group = counts.group_unread_count,
            requests = counts.request_count,
            "Message counts refreshed"
        );

        self.publish(CountsState {
            counts,
            loading: false,
        });
    }

    /// Drive the controller until the returned task is stopped.
    pub fn start(self: &Arc<Self>, refresh_every: Duration) -> BackgroundTask {
        let controller = Arc::clone(self);
        BackgroundTask::spawn("message-counts", async move {
            controller.run(refresh_every).await;
        })
    }

    async fn run(&self, refresh_every: Duration) {
        // Subscribe before the first fetch so no refresh request is missed.
        let mut events = self.bus.subscribe();
        let mut user_rx = self.user_rx.clone();
        let mut last_user = user_rx.borrow_and_update().as_ref().map(|u| u.id.clone());

        let mut ticker = tokio::time::interval_at(Instant::now() + refresh_every, refresh_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(every_secs = refresh_every.as_secs(), "Message counts controller active");
        self.refetch().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.refetch().await,
                event = events.recv() => match event {
                    Ok(AppEvent::RefreshMessageCounts) => self.refetch().await,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Event subscriber lagged, refreshing");
                        self.refetch().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                changed = user_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = user_rx.borrow_and_update().as_ref().map(|u| u.id.clone());
                    if current != last_user {
                        last_user = current;
                        self.refetch().await;
                    }
                }
            }
        }

        info!("Message counts controller stopped");
    }

    fn publish(&self, next: CountsState) {
        let previous = self.state_tx.send_replace(next);
        if previous.counts != next.counts {
            self.bus.publish(AppEvent::UnreadChanged(next.counts));
        }
    }
}

/// Clears `loading` if a refresh is dropped mid-fetch (task stopped or
/// aborted) while it is still the latest one.
struct InFlight<'a> {
    state_tx: &'a watch::Sender<CountsState>,
    generation: &'a AtomicU64,
    mine: u64,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed && self.generation.load(Ordering::SeqCst) == self.mine {
            self.state_tx.send_modify(|state| state.loading = false);
        }
    }
}
