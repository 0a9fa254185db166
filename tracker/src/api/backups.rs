//! Manual backup endpoint.

use crate::server::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use event_tracker_web::AppError;
use serde::Serialize;

/// Body of `POST /backup`.
#[derive(Debug, Serialize)]
pub struct BackupResponse {
    /// File the backup was written to
    pub path: String,
    /// Records in the backup
    pub attendees: usize,
    /// Registry revision the backup reflects
    pub revision: u64,
    /// When the backup was taken
    pub created_at: DateTime<Utc>,
}

/// Write a timestamped backup of the whole registry now.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8000/backup
/// ```
pub async fn create_backup(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<BackupResponse>), AppError> {
    let Some(snapshots) = state.snapshots.as_deref() else {
        return Err(AppError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Backups need DATA_DIR to be set".to_string(),
            "PERSISTENCE_DISABLED".to_string(),
        ));
    };

    let (revision, attendees) = state.registry.snapshot().await;
    let count = attendees.len();
    let created_at = Utc::now();
    let path = snapshots
        .backup(attendees, created_at)
        .await
        .map_err(|err| AppError::internal("Backup failed").with_source(err))?;

    tracing::info!(path = %path.display(), attendees = count, revision, "Manual backup written");
    metrics::counter!("backups.manual.written").increment(1);

    Ok((
        StatusCode::CREATED,
        Json(BackupResponse {
            path: path.display().to_string(),
            attendees: count,
            revision,
            created_at,
        }),
    ))
}
