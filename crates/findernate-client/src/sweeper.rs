//! Periodic eviction of pending messages whose acknowledgement never came.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::warn;

use findernate_chat::PendingMessage;

use crate::events::{AppEvent, EventBus};
use crate::state::{lock, SharedQueue};
use crate::task::BackgroundTask;

/// Run one sweep and announce every evicted entry as timed out.
pub fn sweep_once(queue: &SharedQueue, bus: &EventBus) -> Vec<PendingMessage> {
    let evicted = match lock(queue) {
        Ok(mut queue) => queue.cleanup(),
        Err(e) => {
            warn!(error = %e, "Skipping pending-message sweep");
            return Vec::new();
        }
    };

    for pending in &evicted {
        warn!(
            temp_id = %pending.temporary_id,
            conversation = %pending.conversation_id,
            "Pending message was never acknowledged"
        );
        bus.publish(AppEvent::SendTimedOut {
            temporary_id: pending.temporary_id.clone(),
            conversation_id: pending.conversation_id.clone(),
        });
    }

    evicted
}

/// Sweep `queue` every `every` until the returned task is stopped.
pub fn spawn_queue_sweeper(queue: SharedQueue, bus: EventBus, every: Duration) -> BackgroundTask {
    BackgroundTask::spawn("queue-sweeper", async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; nothing can be stale yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_once(&queue, &bus);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;
    use findernate_chat::MessageQueue;
    use findernate_shared::{ConversationId, TemporaryId};

    #[tokio::test]
    async fn test_sweep_announces_timeouts() {
        let queue: SharedQueue = Arc::new(Mutex::new(MessageQueue::new()));
        {
            let mut q = queue.lock().unwrap();
            q.add_at(
                TemporaryId::from("old"),
                ConversationId::new("c"),
                "lost",
                Utc::now() - chrono::Duration::minutes(5),
            )
            .unwrap();
            q.add(TemporaryId::from("new"), ConversationId::new("c"), "fresh")
                .unwrap();
        }

        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let evicted = sweep_once(&queue, &bus);
        assert_eq!(evicted.len(), 1);
        assert_eq!(queue.lock().unwrap().size(), 1);
        assert_eq!(
            rx.recv().await.unwrap(),
            AppEvent::SendTimedOut {
                temporary_id: TemporaryId::from("old"),
                conversation_id: ConversationId::new("c"),
            }
        );
    }

    #[tokio::test]
    async fn test_background_sweeper_runs() {
        let queue: SharedQueue = Arc::new(Mutex::new(MessageQueue::with_ttl(
            Duration::from_millis(10),
        )));
        queue
            .lock()
            .unwrap()
            .add(TemporaryId::from("t"), ConversationId::new("c"), "x")
            .unwrap();

        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let task = spawn_queue_sweeper(queue.clone(), bus, Duration::from_millis(30));

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("sweeper should fire")
            .unwrap();
        assert_eq!(event.name(), "send-timed-out");
        assert!(queue.lock().unwrap().is_empty());
        task.stop().await;
    }
}
