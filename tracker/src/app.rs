//! Application coordinator: wires the store, persistence and HTTP server.

use crate::config::Config;
use crate::persistence::{run_snapshot_loop, SnapshotStore};
use crate::registry::{
    RegistryEnvironment, RegistryHandle, RegistryReducer, RegistryState, RegistryStore,
};
use crate::server::{build_router, AppState};
use crate::verification::TokenService;
use anyhow::Context;
use axum::Router;
use event_tracker_core::environment::SystemClock;
use event_tracker_runtime::StoreConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

/// Main tracker application.
#[derive(Debug)]
pub struct TrackerApp {
    config: Config,
    state: AppState,
    snapshots: Option<SnapshotStore>,
}

impl TrackerApp {
    /// Build every component and restore the last snapshot, if any.
    ///
    /// # Errors
    ///
    /// Fails when an existing snapshot cannot be read or restored.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let environment = RegistryEnvironment::production()
            .with_max_identifier_retries(config.registry.max_identifier_retries);
        let store: Arc<RegistryStore> = Arc::new(RegistryStore::with_config(
            RegistryState::default(),
            RegistryReducer::new(),
            environment,
            StoreConfig::default().with_broadcast_capacity(config.registry.broadcast_capacity),
        ));
        let registry = RegistryHandle::new(store, config.server.request_timeout());

        let snapshots = config.storage.data_dir.clone().map(SnapshotStore::new);
        if let Some(snapshots) = &snapshots {
            let attendees = snapshots.load().await?;
            if !attendees.is_empty() {
                let restored = registry
                    .restore(attendees)
                    .await
                    .context("restoring snapshot")?;
                tracing::info!(restored, dir = %snapshots.dir().display(), "Registry restored");
            }
        } else {
            tracing::warn!("DATA_DIR not set, attendees are kept in memory only");
        }

        let tokens = TokenService::new(config.verification.secret.as_bytes(), Arc::new(SystemClock))
            .with_max_age(config.verification.max_age());

        let state = AppState::new(
            registry,
            Arc::new(tokens),
            snapshots.clone().map(Arc::new),
            config.registry.default_page_limit,
        );

        Ok(Self {
            config,
            state,
            snapshots,
        })
    }

    /// Shared handler state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// The HTTP router over this application's state.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config.server)
    }

    /// Serve HTTP until Ctrl+C, then drain the store and flush a final snapshot.
    ///
    /// # Errors
    ///
    /// Fails when the listener cannot bind or the server stops abnormally.
    pub async fn run(self) -> anyhow::Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let snapshot_task = match self.snapshots.clone() {
            Some(snapshots) => {
                let registry = self.state.registry.clone();
                let saved_revision = registry.revision().await;
                Some(tokio::spawn(run_snapshot_loop(
                    registry,
                    snapshots,
                    self.config.storage.snapshot_interval(),
                    saved_revision,
                    shutdown_rx,
                )))
            },
            None => None,
        };

        let address = self.config.server.bind_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("binding {address}"))?;
        tracing::info!(%address, "Event tracker listening");

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

        tracing::info!("Shutting down gracefully...");
        if let Err(pending) = self
            .state
            .background
            .drain(self.config.server.shutdown_timeout())
            .await
        {
            tracing::warn!(pending, "Background backups still running at shutdown");
        }

        let store = self.state.registry.store();
        if let Err(err) = store.shutdown(self.config.server.shutdown_timeout()).await {
            tracing::warn!(error = %err, "Store did not drain before the shutdown timeout");
        }

        if let Some(task) = snapshot_task {
            let _ = shutdown_tx.send(true);
            if let Err(err) = task.await {
                tracing::error!(error = %err, "Snapshot task panicked");
            }
        }

        tracing::info!("Shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::types::AttendeeDraft;

    fn config_with_dir(dir: &std::path::Path) -> Config {
        let dir = dir.to_string_lossy().into_owned();
        Config::from_source(|key| (key == "DATA_DIR").then(|| dir.clone()))
    }

    #[tokio::test]
    async fn restores_the_last_snapshot_on_startup() {
        let dir = tempfile::tempdir().unwrap();

        let first = TrackerApp::new(config_with_dir(dir.path())).await.unwrap();
        let created = first
            .state()
            .registry
            .create(AttendeeDraft {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                role: None,
                phone_number: None,
            })
            .await
            .unwrap();
        let (_, attendees) = first.state().registry.snapshot().await;
        SnapshotStore::new(dir.path())
            .save(attendees, chrono::Utc::now())
            .await
            .unwrap();

        let second = TrackerApp::new(config_with_dir(dir.path())).await.unwrap();
        let restored = second
            .state()
            .registry
            .get(created.identifier.as_str())
            .await
            .unwrap();
        assert_eq!(restored, created);
    }

    #[tokio::test]
    async fn starts_empty_without_a_data_dir() {
        let app = TrackerApp::new(Config::default()).await.unwrap();
        assert!(app.state().snapshots.is_none());
        assert_eq!(app.state().registry.count_by_flags().await.total, 0);
    }
}
