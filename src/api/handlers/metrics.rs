use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::AppState;

/// Prometheus scrape endpoint.
pub async fn render(State(state): State<AppState>) -> impl IntoResponse {
    // Detached test recorders have no background upkeep.
    state.metrics_handle.run_upkeep();
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics_handle.render(),
    )
}
