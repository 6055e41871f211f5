use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::AppState;

/// Bearer-token authentication middleware.
///
/// If `API_TOKEN` is configured, every request must carry
/// `Authorization: Bearer <token>` matching that value.
/// If it is unset, authentication is disabled (dev mode).
pub async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.api_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header.and_then(|value| value.strip_prefix("Bearer ")) {
        Some(token) if token == expected => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("Invalid token".into())),
        None => Err(AppError::Unauthorized(
            "Missing or invalid Authorization header".into(),
        )),
    }
}
