use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::RunRequest;
use crate::services::PanelState;
use crate::AppState;

use super::ApiResponse;

/// Trigger a fetch cycle. A body-less call runs the configured defaults.
///
/// The outcome is always reported in the body; a failed run answers 502
/// because the upstream service is what failed.
pub async fn run(State(state): State<AppState>, body: Option<Json<RunRequest>>) -> Response {
    let request = body
        .map(|Json(request)| request)
        .unwrap_or_else(|| RunRequest::new(Vec::new()));

    let outcome = state.panel.run(request).await;
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(outcome)).into_response()
}

pub async fn state(State(state): State<AppState>) -> Json<ApiResponse<PanelState>> {
    Json(ApiResponse::ok(state.panel.state().await))
}

pub async fn reset(State(state): State<AppState>) -> Json<ApiResponse<PanelState>> {
    state.panel.reset().await;
    Json(ApiResponse::ok(state.panel.state().await))
}

pub async fn dismiss_error(State(state): State<AppState>) -> Json<ApiResponse<PanelState>> {
    state.panel.dismiss_error().await;
    Json(ApiResponse::ok(state.panel.state().await))
}
