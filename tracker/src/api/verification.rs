//! Verification token endpoints.

use super::{invalid_input, task_failed};
use crate::server::AppState;
use crate::types::{Attendee, Identifier};
use crate::verification::{render_data_uri, Palette};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use event_tracker_web::{AppError, ClientIp, UserAgent};
use serde::{Deserialize, Serialize};

/// Body of `GET /qrcode/:id`.
#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
    /// Attendee the code belongs to
    pub identifier: Identifier,
    /// Name printed next to the code
    pub name: String,
    /// Role, which picks the colours
    pub role: Option<String>,
    /// Token encoded in the image
    pub token: String,
    /// `data:image/png;base64,...`
    pub qr_code: String,
}

/// Body of `POST /verify`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyRequest {
    /// Scanned token text
    pub token: String,
}

/// Issue a token for an attendee and render it as a QR code.
pub async fn qr_code(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<QrCodeResponse>, AppError> {
    let attendee = state.registry.get(&identifier).await?;
    let token = state.tokens.issue(&attendee.identifier);
    let palette = Palette::for_role(attendee.role.as_deref());

    let qr_code = {
        let token = token.clone();
        tokio::task::spawn_blocking(move || render_data_uri(&token, palette))
            .await
            .map_err(task_failed)?
            .map_err(|err| AppError::internal("QR rendering failed").with_source(err))?
    };

    Ok(Json(QrCodeResponse {
        identifier: attendee.identifier,
        name: attendee.name,
        role: attendee.role,
        token,
        qr_code,
    }))
}

/// Resolve a scanned token to the attendee it belongs to.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8000/verify \
///   -H "Content-Type: application/json" \
///   -d '{"token": "ETK1...."}'
/// ```
pub async fn verify(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    request: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<Attendee>, AppError> {
    let Json(request) = request.map_err(invalid_input)?;

    match state.tokens.verify(&request.token, &state.registry).await {
        Ok(attendee) => {
            tracing::info!(
                identifier = %attendee.identifier,
                %client_ip,
                "Token verified"
            );
            metrics::counter!("verification.tokens.accepted").increment(1);
            Ok(Json(attendee))
        },
        Err(err) => {
            tracing::warn!(%client_ip, user_agent = %user_agent, error = %err, "Token rejected");
            metrics::counter!("verification.tokens.rejected").increment(1);
            Err(err.into())
        },
    }
}
