//! Typed application events.
//!
//! The [`EventBus`] delivers every published event to in-process subscribers
//! through a tokio broadcast channel. A [`RemoteTransport`] can be attached
//! to relay events to (and receive them from) other client processes; the
//! bus tags what it publishes with its own origin id so it never re-delivers
//! its own events when they come back from the remote side.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use findernate_chat::DerivedCounts;
use findernate_shared::constants::{
    EVENT_REFRESH_MESSAGE_COUNTS, EVENT_SEND_TIMED_OUT, EVENT_UNREAD_CHANGED, SIGNAL_RETENTION,
};
use findernate_shared::{ConversationId, TemporaryId};

use crate::error::Result;
use crate::state::{lock, SharedStore};
use crate::task::BackgroundTask;

const LOCAL_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "kebab-case")]
pub enum AppEvent {
    /// Ask the counts controller to refresh immediately.
    RefreshMessageCounts,
    /// A pending message was swept without ever being acknowledged.
    #[serde(rename_all = "camelCase")]
    SendTimedOut {
        temporary_id: TemporaryId,
        conversation_id: ConversationId,
    },
    /// Badge counters changed.
    UnreadChanged(DerivedCounts),
}

impl AppEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::RefreshMessageCounts => EVENT_REFRESH_MESSAGE_COUNTS,
            AppEvent::SendTimedOut { .. } => EVENT_SEND_TIMED_OUT,
            AppEvent::UnreadChanged(_) => EVENT_UNREAD_CHANGED,
        }
    }
}

// ---------------------------------------------------------------------------
// Remote transport
// ---------------------------------------------------------------------------

/// Carries events between processes.
pub trait RemoteTransport: Send + Sync {
    /// Hand `event` to other processes.
    fn send(&self, origin: &str, event: &AppEvent) -> Result<()>;

    /// Events published by other origins since the previous poll.
    fn poll(&self, origin: &str) -> Result<Vec<AppEvent>>;
}

/// [`RemoteTransport`] over the local store's signal log.
pub struct StoreTransport {
    store: SharedStore,
    cursor: Mutex<i64>,
}

impl StoreTransport {
    /// Attach to the signal log; signals written before now are not replayed.
    pub fn new(store: SharedStore) -> Result<Self> {
        let latest = lock(&store)?.latest_signal_seq()?;
        Ok(Self {
            store,
            cursor: Mutex::new(latest),
        })
    }
}

impl RemoteTransport for StoreTransport {
    fn send(&self, origin: &str, event: &AppEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let db = lock(&self.store)?;
        let seq = db.push_signal(origin, event.name(), &payload)?;
        db.prune_signals(SIGNAL_RETENTION)?;
        trace!(seq, event = event.name(), "Signal written");
        Ok(())
    }

    fn poll(&self, origin: &str) -> Result<Vec<AppEvent>> {
        let mut cursor = lock(&self.cursor)?;
        let signals = lock(&self.store)?.signals_since(*cursor)?;

        let mut events = Vec::new();
        for signal in signals {
            *cursor = (*cursor).max(signal.seq);
            if signal.origin == origin {
                continue;
            }
            match serde_json::from_str::<AppEvent>(&signal.payload) {
                Ok(event) => events.push(event),
                Err(e) => {
                    debug!(seq = signal.seq, name = %signal.name, error = %e, "Skipping unknown signal")
                }
            }
        }
        Ok(events)
    }
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

struct BusInner {
    origin: String,
    local: broadcast::Sender<AppEvent>,
    /// Outbound queue of the remote relay task, when one is attached.
    remote: RwLock<Option<mpsc::UnboundedSender<AppEvent>>>,
}

/// Publish/subscribe channel for [`AppEvent`]s. Clones share subscribers.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        let (local, _) = broadcast::channel(LOCAL_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(BusInner {
                origin: Uuid::new_v4().to_string(),
                local,
                remote: RwLock::new(None),
            }),
        }
    }

    /// Id stamped on everything this bus sends to the remote transport.
    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.inner.local.subscribe()
    }

    /// Deliver `event` locally and queue it for the remote relay.
    ///
    /// Never blocks and never fails: the transport write happens on the
    /// relay task, and delivery problems are logged.
    pub fn publish(&self, event: AppEvent) {
        debug!(event = event.name(), "Publishing event");

        if let Some(outbound) = self.outbound() {
            if outbound.send(event.clone()).is_err() {
                debug!(event = event.name(), "Remote relay stopped, event kept local");
            }
        }

        self.deliver_local(event);
    }

    /// Relay events to and from other processes until the returned task is
    /// stopped.
    ///
    /// Transport calls run on the blocking pool, one at a time, so remote
    /// writes keep their publish order.
    pub fn attach_remote(
        &self,
        transport: Arc<dyn RemoteTransport>,
        poll_every: Duration,
    ) -> BackgroundTask {
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
        if let Ok(mut guard) = self.inner.remote.write() {
            *guard = Some(outbound_tx);
        }

        let bus = self.clone();
        BackgroundTask::spawn("remote-events", async move {
            let mut ticker = tokio::time::interval(poll_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    outbound = outbound_rx.recv() => match outbound {
                        Some(event) => bus.forward(&transport, event).await,
                        None => break,
                    },
                    _ = ticker.tick() => bus.pull(&transport).await,
                }
            }
            debug!("Remote event relay detached");
        })
    }

    /// Stop forwarding published events to the remote transport.
    pub fn detach_remote(&self) {
        if let Ok(mut guard) = self.inner.remote.write() {
            *guard = None;
        }
    }

    fn outbound(&self) -> Option<mpsc::UnboundedSender<AppEvent>> {
        self.inner
            .remote
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    async fn forward(&self, transport: &Arc<dyn RemoteTransport>, event: AppEvent) {
        let transport = Arc::clone(transport);
        let origin = self.origin().to_string();
        let name = event.name();
        match task::spawn_blocking(move || transport.send(&origin, &event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(event = name, error = %e, "Failed to forward event to other processes")
            }
            Err(e) => warn!(event = name, error = %e, "Event forwarder panicked"),
        }
    }

    async fn pull(&self, transport: &Arc<dyn RemoteTransport>) {
        let transport = Arc::clone(transport);
        let origin = self.origin().to_string();
        match task::spawn_blocking(move || transport.poll(&origin)).await {
            Ok(Ok(events)) => {
                for event in events {
                    debug!(event = event.name(), "Event received from another process");
                    self.deliver_local(event);
                }
            }
            Ok(Err(e)) => warn!(error = %e, "Polling remote events failed"),
            Err(e) => warn!(error = %e, "Event poller panicked"),
        }
    }

    fn deliver_local(&self, event: AppEvent) {
        if self.inner.local.send(event).is_err() {
            trace!("No local subscribers for event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use findernate_store::Database;

    fn shared_store(path: &std::path::Path) -> SharedStore {
        Arc::new(Mutex::new(Database::open_at(path).unwrap()))
    }

    #[test]
    fn test_wire_names_match_serde_tags() {
        let events = [
            AppEvent::RefreshMessageCounts,
            AppEvent::SendTimedOut {
                temporary_id: TemporaryId::from("t"),
                conversation_id: ConversationId::new("c"),
            },
            AppEvent::UnreadChanged(DerivedCounts::zero()),
        ];
        for event in events {
            let json: serde_json::Value = serde_json::to_value(&event).unwrap();
            assert_eq!(json["name"], event.name());
            let back: AppEvent = serde_json::from_value(json).unwrap();
            assert_eq!(back, event);
        }
    }

    #[tokio::test]
    async fn test_local_delivery() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let clone = bus.clone();

        clone.publish(AppEvent::RefreshMessageCounts);
        assert_eq!(rx.recv().await.unwrap(), AppEvent::RefreshMessageCounts);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        EventBus::new().publish(AppEvent::RefreshMessageCounts);
    }

    #[test]
    fn test_store_transport_skips_own_origin_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bus.db");

        let a = StoreTransport::new(shared_store(&path)).unwrap();
        a.send("a", &AppEvent::RefreshMessageCounts).unwrap();

        // Created after the first signal: does not replay it.
        let b = StoreTransport::new(shared_store(&path)).unwrap();
        assert!(b.poll("b").unwrap().is_empty());

        a.send("a", &AppEvent::RefreshMessageCounts).unwrap();
        assert_eq!(b.poll("b").unwrap(), vec![AppEvent::RefreshMessageCounts]);
        assert!(b.poll("b").unwrap().is_empty());

        // a's own signals are filtered out for a.
        assert!(a.poll("a").unwrap().is_empty());
    }

    /// Transport whose writes take a while, recording what it was sent.
    #[derive(Default)]
    struct SlowTransport {
        sent: Mutex<Vec<&'static str>>,
    }

    impl RemoteTransport for SlowTransport {
        fn send(&self, _origin: &str, event: &AppEvent) -> Result<()> {
            std::thread::sleep(Duration::from_millis(200));
            self.sent.lock().unwrap().push(event.name());
            Ok(())
        }

        fn poll(&self, _origin: &str) -> Result<Vec<AppEvent>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_publish_does_not_wait_for_transport() {
        let bus = EventBus::new();
        let transport = Arc::new(SlowTransport::default());
        let relay = bus.attach_remote(transport.clone(), Duration::from_secs(3600));
        let mut rx = bus.subscribe();

        let started = std::time::Instant::now();
        bus.publish(AppEvent::RefreshMessageCounts);
        bus.publish(AppEvent::UnreadChanged(DerivedCounts::zero()));
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(rx.recv().await.unwrap(), AppEvent::RefreshMessageCounts);

        tokio::time::timeout(Duration::from_secs(3), async {
            while transport.sent.lock().unwrap().len() < 2 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("relay should forward both events");
        assert_eq!(
            *transport.sent.lock().unwrap(),
            vec![EVENT_REFRESH_MESSAGE_COUNTS, EVENT_UNREAD_CHANGED]
        );

        bus.detach_remote();
        relay.stop().await;
    }

    #[tokio::test]
    async fn test_events_cross_between_buses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bus.db");

        let first = EventBus::new();
        let second = EventBus::new();
        let _pump_first = first.attach_remote(
            Arc::new(StoreTransport::new(shared_store(&path)).unwrap()),
            Duration::from_millis(20),
        );
        let _pump_second = second.attach_remote(
            Arc::new(StoreTransport::new(shared_store(&path)).unwrap()),
            Duration::from_millis(20),
        );

        let mut first_rx = first.subscribe();
        let mut second_rx = second.subscribe();
        first.publish(AppEvent::RefreshMessageCounts);

        let received = tokio::time::timeout(Duration::from_secs(2), second_rx.recv())
            .await
            .expect("event should cross processes")
            .unwrap();
        assert_eq!(received, AppEvent::RefreshMessageCounts);

        // The publisher sees its event exactly once.
        assert_eq!(first_rx.recv().await.unwrap(), AppEvent::RefreshMessageCounts);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(first_rx.try_recv().is_err());
    }
}
