//! JSON snapshots of the registry on local disk.
//!
//! `<data_dir>/attendees.json` holds the latest snapshot. Writes go to a
//! temporary file first and are renamed into place. Import backups land
//! next to it as `backup_<YYYYmmdd_HHMMSS>.json`.

use crate::registry::RegistryHandle;
use crate::types::Attendee;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;

/// File name of the live snapshot.
pub const SNAPSHOT_FILE: &str = "attendees.json";

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    saved_at: DateTime<Utc>,
    attendees: Vec<Attendee>,
}

/// Reads and writes snapshot files in one directory.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Store snapshots under `dir`, created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the snapshots.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the live snapshot.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Load the live snapshot. A missing file is an empty registry.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> anyhow::Result<Vec<Attendee>> {
        let path = self.snapshot_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No snapshot found, starting empty");
                return Ok(Vec::new());
            },
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            },
        };

        let file: SnapshotFile = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            attendees = file.attendees.len(),
            saved_at = %file.saved_at,
            "Loaded snapshot"
        );
        Ok(file.attendees)
    }

    /// Atomically replace the live snapshot.
    ///
    /// # Errors
    ///
    /// Fails on any filesystem or serialization error.
    pub async fn save(&self, attendees: Vec<Attendee>, saved_at: DateTime<Utc>) -> anyhow::Result<()> {
        let path = self.snapshot_path();
        self.write_atomic(&path, attendees, saved_at).await?;
        tracing::debug!(path = %path.display(), "Snapshot written");
        Ok(())
    }

    /// Write a timestamped backup copy and return its path.
    ///
    /// Names carry millisecond precision. A name that is already taken gets
    /// a `_1`, `_2`, ... suffix so no earlier backup is overwritten.
    ///
    /// # Errors
    ///
    /// Fails on any filesystem or serialization error.
    pub async fn backup(&self, attendees: Vec<Attendee>, at: DateTime<Utc>) -> anyhow::Result<PathBuf> {
        let stem = format!("backup_{}", at.format("%Y%m%d_%H%M%S_%3f"));
        let mut path = self.dir.join(format!("{stem}.json"));
        let mut suffix = 0u32;
        while tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("checking {}", path.display()))?
        {
            suffix += 1;
            path = self.dir.join(format!("{stem}_{suffix}.json"));
        }
        self.write_atomic(&path, attendees, at).await?;
        tracing::info!(path = %path.display(), "Backup written");
        Ok(path)
    }

    async fn write_atomic(
        &self,
        path: &Path,
        attendees: Vec<Attendee>,
        saved_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;

        let body = serde_json::to_vec_pretty(&SnapshotFile { saved_at, attendees })
            .context("serializing snapshot")?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        Ok(())
    }
}

/// Write a snapshot whenever the registry revision moves, checking every
/// `interval`, and once more when `shutdown` flips to `true`.
///
/// `saved_revision` is the revision already on disk when the loop starts.
///
/// Failures are logged and retried on the next tick.
pub async fn run_snapshot_loop(
    registry: RegistryHandle,
    snapshots: SnapshotStore,
    interval: Duration,
    mut saved_revision: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                saved_revision = save_if_changed(&registry, &snapshots, Some(saved_revision)).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    // Always flush on shutdown
                    save_if_changed(&registry, &snapshots, None).await;
                    tracing::info!("Snapshot task stopped");
                    return;
                }
            }
        }
    }
}

/// Returns the revision now on disk. `saved` of `None` forces a write.
async fn save_if_changed(
    registry: &RegistryHandle,
    snapshots: &SnapshotStore,
    saved: Option<u64>,
) -> u64 {
    let (revision, attendees) = registry.snapshot().await;
    if saved == Some(revision) {
        return revision;
    }

    match snapshots.save(attendees, Utc::now()).await {
        Ok(()) => {
            metrics::counter!("persistence.snapshots.written").increment(1);
            revision
        },
        Err(err) => {
            tracing::error!(error = ?err, "Snapshot write failed");
            metrics::counter!("persistence.snapshots.failed").increment(1);
            saved.unwrap_or_default()
        },
    }
}
