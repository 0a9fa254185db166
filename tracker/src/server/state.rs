//! Application state for the tracker HTTP server.

use super::tasks::BackgroundTasks;
use crate::persistence::SnapshotStore;
use crate::registry::{RegistryHandle, RegistryStore};
use crate::verification::TokenService;
use axum::extract::FromRef;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Registry commands and queries
    pub registry: RegistryHandle,

    /// Verification token issuer
    pub tokens: Arc<TokenService>,

    /// Where import backups go, when persistence is enabled
    pub snapshots: Option<Arc<SnapshotStore>>,

    /// `limit` used when a search does not give one
    pub default_page_limit: usize,

    /// Backups still being written after their request returned
    pub background: BackgroundTasks,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        registry: RegistryHandle,
        tokens: Arc<TokenService>,
        snapshots: Option<Arc<SnapshotStore>>,
        default_page_limit: usize,
    ) -> Self {
        Self {
            registry,
            tokens,
            snapshots,
            default_page_limit,
            background: BackgroundTasks::new(),
        }
    }
}

// Lets the generic readiness handler extract the store from AppState
impl FromRef<AppState> for Arc<RegistryStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.store().clone()
    }
}
