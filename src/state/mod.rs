/// Matchup result lifecycle (`Open` / `Decided` / `Locked`).
pub mod match_phase;
mod sse;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};

use crate::{config::AppConfig, dao::match_store::MatchStore, error::ServiceError};

pub use self::sse::SseHub;
use self::sse::SseState;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing the storage handle, notifier hubs, and
/// runtime configuration.
pub struct AppState {
    match_store: RwLock<Option<Arc<dyn MatchStore>>>,
    sse: SseState,
    degraded: watch::Sender<bool>,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let sse = SseState::new(config.sse_public_capacity(), config.sse_admin_capacity());
        Arc::new(Self {
            match_store: RwLock::new(None),
            sse,
            degraded: degraded_tx,
            config: Arc::new(config),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Obtain a handle to the current match store, if one is installed.
    pub async fn match_store(&self) -> Option<Arc<dyn MatchStore>> {
        let guard = self.match_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the match store or fail with the degraded-mode service error.
    pub async fn require_match_store(&self) -> Result<Arc<dyn MatchStore>, ServiceError> {
        self.match_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new match store implementation and leave degraded mode.
    pub async fn set_match_store(&self, store: Arc<dyn MatchStore>) {
        {
            let mut guard = self.match_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current match store and enter degraded mode.
    pub async fn clear_match_store(&self) {
        {
            let mut guard = self.match_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
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
        if *self.degraded.borrow() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Broadcast hub used for the admin SSE stream.
    pub fn admin_sse(&self) -> &SseHub {
        self.sse.admin().hub()
    }

    /// Token guard that ensures a single admin SSE subscriber at a time.
    pub fn admin_token(&self) -> &Mutex<Option<String>> {
        self.sse.admin().token()
    }
}
