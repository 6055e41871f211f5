use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::ledger::{LedgerView, SortField};
use crate::AppState;

use super::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub field: String,
}

pub async fn ledger(
    State(state): State<AppState>,
    Path(strategy): Path<String>,
) -> Result<Json<ApiResponse<LedgerView>>, AppError> {
    let view = state.panel.ledger(&strategy).await?;
    Ok(Json(ApiResponse::ok(view)))
}

/// Column-header click: same field flips direction, a new field sorts
/// ascending.
pub async fn sort(
    State(state): State<AppState>,
    Path(strategy): Path<String>,
    Json(body): Json<SortRequest>,
) -> Result<Json<ApiResponse<LedgerView>>, AppError> {
    let field = SortField::from_str(&body.field)
        .ok_or_else(|| AppError::BadRequest(format!("unknown sort field `{}`", body.field)))?;
    let view = state.panel.select_sort(&strategy, field).await?;
    Ok(Json(ApiResponse::ok(view)))
}

pub async fn collapse(
    State(state): State<AppState>,
    Path(strategy): Path<String>,
) -> Result<Json<ApiResponse<LedgerView>>, AppError> {
    let view = state.panel.toggle_collapsed(&strategy).await?;
    Ok(Json(ApiResponse::ok(view)))
}
