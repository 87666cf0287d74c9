//! Operational HTTP endpoints (ambient ops stack, spec §9's "out of
//! scope but still needed" surface): health, readiness, metrics, and the
//! one in-scope plain-HTTP collaborator call-in, alert acknowledgement.

pub mod metrics;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use sentrylink_core::domain::ActiveAlertId;

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, "ready")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render();
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

#[derive(Serialize)]
struct AcknowledgeResponse {
    acknowledged: bool,
}

/// `POST /alerts/:id/acknowledge` (spec §6.3): the one HTTP surface a
/// companion app can call without going through a WS session, since
/// acknowledging doesn't require an open producer socket.
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Response {
    let alert_id: ActiveAlertId = id.into();
    let Ok(Some(alert)) = state.store().get_active_alert(alert_id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.alert_loop().acknowledge(alert_id, alert.user_id).await {
        Ok(()) => Json(AcknowledgeResponse { acknowledged: true }).into_response(),
        Err(err) => (StatusCode::BAD_REQUEST, err.client_message()).into_response(),
    }
}
