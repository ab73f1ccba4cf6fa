//! Client state shared across tasks.
//!
//! [`ClientState`] owns the store, the session, the pending-message queue,
//! the event bus and the counts controller. Nothing here is global: hosts
//! that need several independent chat panels construct several states.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use tracing::{debug, info};

use findernate_api::{ApiClient, ApiConfig, ConversationSource};
use findernate_chat::{reconcile, MessageQueue, PendingMessage, Reconciliation};
use findernate_shared::{ConversationId, CurrentUser, ServerMessage, TemporaryId};
use findernate_store::Database;

use crate::config::ClientConfig;
use crate::counts::{CountsState, MessageCountsController};
use crate::error::{ClientError, Result};
use crate::events::{AppEvent, EventBus, StoreTransport};
use crate::session::Session;
use crate::sweeper::spawn_queue_sweeper;
use crate::task::BackgroundTask;

pub type SharedStore = Arc<Mutex<Database>>;
pub type SharedQueue = Arc<Mutex<MessageQueue>>;
pub type SharedSource = Arc<dyn ConversationSource>;

/// Lock a std mutex, mapping poisoning to [`ClientError::LockPoisoned`].
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| ClientError::LockPoisoned(e.to_string()))
}

/// Central client state.
pub struct ClientState {
    config: ClientConfig,
    store: SharedStore,
    session: Arc<Session>,
    /// Token holder of the HTTP client; `None` when a custom source is used.
    api: Option<ApiClient>,
    bus: EventBus,
    queue: SharedQueue,
    counts: Arc<MessageCountsController<SharedSource>>,
}

/// Background tasks started by [`ClientState::start`].
pub struct RunningTasks {
    pub counts: BackgroundTask,
    pub sweeper: BackgroundTask,
    pub remote_events: Option<BackgroundTask>,
}

impl RunningTasks {
    pub async fn shutdown(self) {
        self.counts.stop().await;
        self.sweeper.stop().await;
        if let Some(remote) = self.remote_events {
            remote.stop().await;
        }
        info!("Client tasks stopped");
    }
}

impl ClientState {
    /// Open the local store and wire the REST client as conversation source.
    pub fn open(config: ClientConfig) -> anyhow::Result<Self> {
        let db = match config.data_path {
            Some(ref path) => Database::open_at(path),
            None => Database::new(),
        }
        .context("failed to open local store")?;

        let api = ApiClient::new(ApiConfig {
            base_url: config.api_base_url.clone(),
            timeout: config.http_timeout,
        })
        .context("failed to build API client")?;
        info!(api = %api.base_url(), "Using REST backend");

        let source: SharedSource = Arc::new(api.clone());
        let state = Self::assemble(config, db, source, Some(api))?;
        Ok(state)
    }

    /// Build a state around an arbitrary conversation source.
    pub fn with_source(
        config: ClientConfig,
        db: Database,
        source: SharedSource,
    ) -> Result<Self> {
        Self::assemble(config, db, source, None)
    }

    fn assemble(
        config: ClientConfig,
        db: Database,
        source: SharedSource,
        api: Option<ApiClient>,
    ) -> Result<Self> {
        let store: SharedStore = Arc::new(Mutex::new(db));
        let session = Arc::new(Session::restore(store.clone())?);

        if let Some(ref api) = api {
            api.set_token(session.token());
        }

        let bus = EventBus::new();
        let queue = Arc::new(Mutex::new(MessageQueue::with_ttl(config.pending_ttl)));
        let counts = MessageCountsController::new(source, session.watch(), bus.clone());

        Ok(Self {
            config,
            store,
            session,
            api,
            bus,
            queue,
            counts,
        })
    }

    /// Start the counts controller, the queue sweeper and, if enabled, the
    /// cross-process event relay.
    pub fn start(&self) -> Result<RunningTasks> {
        let remote_events = if self.config.cross_process_events {
            let transport = Arc::new(StoreTransport::new(self.store.clone())?);
            Some(
                self.bus
                    .attach_remote(transport, self.config.signal_poll_interval),
            )
        } else {
            None
        };

        let counts = self.counts.start(self.config.counts_refresh_interval);
        let sweeper = spawn_queue_sweeper(
            self.queue.clone(),
            self.bus.clone(),
            self.config.queue_sweep_interval,
        );

        info!(
            cross_process = self.config.cross_process_events,
            "Client started"
        );

        Ok(RunningTasks {
            counts,
            sweeper,
            remote_events,
        })
    }

    // -- Session --

    pub fn login(&self, user: CurrentUser, token: String) -> Result<()> {
        if let Some(ref api) = self.api {
            api.set_token(Some(token.clone()));
        }
        self.session.login(user, token)
    }

    /// Sign out and drop every pending optimistic message.
    pub fn logout(&self) -> Result<()> {
        if let Some(ref api) = self.api {
            api.set_token(None);
        }
        let dropped = {
            let mut queue = lock(&self.queue)?;
            let dropped = queue.size();
            let ttl = queue.ttl();
            *queue = MessageQueue::with_ttl(ttl);
            dropped
        };
        debug!(dropped, "Cleared pending messages on logout");
        self.session.logout()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // -- Optimistic messaging --

    /// Record a message the UI is about to render before the backend
    /// confirms it.
    pub fn send_optimistic(
        &self,
        conversation_id: ConversationId,
        content: impl Into<String>,
    ) -> Result<PendingMessage> {
        if !self.session.is_authenticated() {
            return Err(ClientError::NotSignedIn);
        }
        let mut queue = lock(&self.queue)?;
        let pending = queue.add(TemporaryId::new(), conversation_id, content)?;
        Ok(pending.clone())
    }

    /// Feed an authoritative message from the realtime channel.
    pub fn apply_server_message(&self, message: ServerMessage) -> Result<Reconciliation> {
        let user = self.session.current_user().ok_or(ClientError::NotSignedIn)?;
        let mut queue = lock(&self.queue)?;
        Ok(reconcile(&mut queue, message, &user.id))
    }

    /// Retract a pending message whose send failed.
    pub fn retract(&self, temporary_id: &TemporaryId) -> Result<bool> {
        Ok(lock(&self.queue)?.remove(temporary_id))
    }

    /// Drop pending messages of a conversation that was closed or left.
    pub fn close_conversation(&self, conversation_id: &ConversationId) -> Result<usize> {
        let dropped = lock(&self.queue)?.clear_chat(conversation_id);
        if dropped > 0 {
            debug!(conversation = %conversation_id, dropped, "Discarded pending messages");
        }
        Ok(dropped)
    }

    /// Pending messages of a conversation, oldest first.
    pub fn pending_for(&self, conversation_id: &ConversationId) -> Result<Vec<PendingMessage>> {
        Ok(lock(&self.queue)?
            .get_pending_for_chat(conversation_id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.queue
    }

    // -- Counters --

    pub fn counts(&self) -> &Arc<MessageCountsController<SharedSource>> {
        &self.counts
    }

    pub fn counts_snapshot(&self) -> CountsState {
        self.counts.snapshot()
    }

    /// Ask every listening controller (in this and other processes) to
    /// refresh now.
    pub fn request_counts_refresh(&self) {
        self.bus.publish(AppEvent::RefreshMessageCounts);
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
