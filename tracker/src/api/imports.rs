//! Bulk CSV import endpoint.

use super::task_failed;
use crate::csv_import::{parse_upload, ImportReport};
use crate::error::TrackerError;
use crate::server::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use event_tracker_web::{AppError, CorrelationId};

/// Multipart field carrying the CSV file.
pub const UPLOAD_FIELD: &str = "file";

/// Import attendees from an uploaded CSV file.
///
/// Row problems only skip the row; the report lists them.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8000/upload-csv -F 'file=@attendees.csv'
/// ```
pub async fn upload_csv(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    mut multipart: Multipart,
) -> Result<Json<ImportReport>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            upload = Some((file_name, bytes));
            break;
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Err(TrackerError::MalformedCsv(format!(
            "missing multipart field `{UPLOAD_FIELD}`"
        ))
        .into());
    };

    let batch = tokio::task::spawn_blocking(move || parse_upload(file_name.as_deref(), &bytes))
        .await
        .map_err(task_failed)??;

    let report = state.registry.import(batch).await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        total_processed = report.total_processed,
        added = report.added,
        skipped = report.skipped,
        "CSV import finished"
    );
    metrics::counter!("imports.attendees.added").increment(report.added as u64);
    metrics::counter!("imports.rows.rejected").increment(report.skipped as u64);

    if report.added > 0 {
        if let Some(snapshots) = state.snapshots.clone() {
            let registry = state.registry.clone();
            state.background.spawn(async move {
                let (_, attendees) = registry.snapshot().await;
                if let Err(err) = snapshots.backup(attendees, Utc::now()).await {
                    tracing::error!(error = ?err, "Import backup failed");
                }
            });
        }
    }

    Ok(Json(report))
}

fn multipart_error(err: MultipartError) -> AppError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(status, err.body_text(), "PAYLOAD_TOO_LARGE".to_string())
    } else {
        TrackerError::MalformedCsv(err.body_text()).into()
    }
}
