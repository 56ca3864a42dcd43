pub mod room_status;
mod sse;

use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard, RwLock, watch};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig, dao::room_store::RoomStore, error::ServiceError, spotify::SpotifyClient,
};

pub use self::sse::RoomEventHub;

pub type SharedState = Arc<AppState>;
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
/// Buffered events per room stream before slow subscribers start lagging.
const ROOM_EVENTS_CAPACITY: usize = 32;

/// Central application state storing the storage handle, upstream clients and per-room runtime data.
pub struct AppState {
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    spotify: SpotifyClient,
    sessions: DashMap<String, Uuid>,
    room_events: DashMap<String, Arc<RoomEventHub>>,
    room_locks: DashMap<String, Arc<Mutex<()>>>,
    operation_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, spotify: SpotifyClient) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            room_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            spotify,
            sessions: DashMap::new(),
            room_events: DashMap::new(),
            room_locks: DashMap::new(),
            operation_timeout: Some(DEFAULT_OPERATION_TIMEOUT),
        })
    }

    /// Obtain a handle to the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        let guard = self.room_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the room store or fail with [`ServiceError::Degraded`].
    pub async fn require_room_store(&self) -> Result<Arc<dyn RoomStore>, ServiceError> {
        self.room_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new room store implementation and leave degraded mode.
    pub async fn set_room_store(&self, store: Arc<dyn RoomStore>) {
        {
            let mut guard = self.room_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Spotify Web API client.
    pub fn spotify(&self) -> &SpotifyClient {
        &self.spotify
    }

    /// Session tokens mapped to the user they authenticate.
    pub fn sessions(&self) -> &DashMap<String, Uuid> {
        &self.sessions
    }

    /// Event hub of a room, created on first use.
    pub fn room_events(&self, room_id: &str) -> Arc<RoomEventHub> {
        self.room_events
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(RoomEventHub::new(room_id, ROOM_EVENTS_CAPACITY)))
            .clone()
    }

    /// Event hub of a room, only if someone subscribed to it already.
    pub fn existing_room_events(&self, room_id: &str) -> Option<Arc<RoomEventHub>> {
        self.room_events.get(room_id).map(|hub| hub.clone())
    }

    /// Drop the per-room runtime data of a deleted room.
    pub fn forget_room(&self, room_id: &str) {
        if let Some((_, hub)) = self.room_events.remove(room_id) {
            debug!(room_id, streams = hub.subscriber_count(), "closing room streams");
        }
        self.room_locks.remove(room_id);
    }

    /// Run `work` while holding the room's mutation lock.
    ///
    /// Mutations of one room are serialised so read-modify-write sequences (answers, host
    /// hand-off, score updates) never interleave. The operation timeout bounds the wait for the
    /// lock only: once acquired, `work` runs to completion so its writes are never cut in half.
    /// The lock entry is dropped again when no other caller holds or waits on it.
    pub async fn with_room_lock<F, Fut, T>(&self, room_id: &str, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let lock = self
            .room_locks
            .entry(room_id.to_string())
            .or_default()
            .clone();

        let result = match self.acquire(room_id, &lock).await {
            Ok(_guard) => work().await,
            Err(err) => Err(err),
        };

        drop(lock);
        self.room_locks
            .remove_if(room_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn acquire<'a>(
        &self,
        room_id: &str,
        lock: &'a Mutex<()>,
    ) -> Result<MutexGuard<'a, ()>, ServiceError> {
        match self.operation_timeout {
            Some(limit) => timeout(limit, lock.lock()).await.map_err(|_| {
                warn!(room_id, "timed out waiting for the room lock");
                ServiceError::Timeout
            }),
            None => Ok(lock.lock().await),
        }
    }
}
