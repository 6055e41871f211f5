use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes; require Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Dashboard panel
        .route("/api/dashboard/run", post(handlers::dashboard::run))
        .route("/api/dashboard/state", get(handlers::dashboard::state))
        .route("/api/dashboard/reset", post(handlers::dashboard::reset))
        .route("/api/dashboard/dismiss-error", post(handlers::dashboard::dismiss_error))
        // Trade ledgers
        .route("/api/dashboard/trades/:strategy", get(handlers::trades::ledger))
        .route("/api/dashboard/trades/:strategy/sort", post(handlers::trades::sort))
        .route("/api/dashboard/trades/:strategy/collapse", post(handlers::trades::collapse))
        // Analytics
        .route("/api/analytics/comparison", get(handlers::analytics::comparison))
        .route("/api/analytics/distribution", get(handlers::analytics::distribution))
        // WebSocket
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
