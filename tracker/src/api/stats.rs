//! Aggregate and export endpoints.

use super::invalid_input;
use crate::export::{render, ReportKind};
use crate::server::AppState;
use crate::stats::{Stats, StatsReport};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use event_tracker_web::AppError;
use serde::Deserialize;

/// Query string of `GET /export.csv`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportQuery {
    /// `check_in` or `kit` for a summary; the full report otherwise
    #[serde(default)]
    pub report: ReportKind,
}

/// Flag counts.
pub async fn stats(State(state): State<AppState>) -> Json<Stats> {
    Json(state.registry.count_by_flags().await)
}

/// Counts with percentages and a per-role breakdown.
pub async fn stats_report(State(state): State<AppState>) -> Json<StatsReport> {
    Json(state.registry.report().await)
}

/// Attendees as a CSV download, the full report unless `report` picks a summary.
///
/// # Example
///
/// ```bash
/// curl -OJ 'http://localhost:8000/export.csv?report=check_in'
/// ```
pub async fn export_csv(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(invalid_input)?;
    let (_, attendees) = state.registry.snapshot().await;
    let body = render(query.report, &attendees)
        .map_err(|err| AppError::internal("Export failed").with_source(err))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", query.report.file_name()),
            ),
        ],
        body,
    ))
}
