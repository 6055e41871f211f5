use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::services::dashboard::{ComparisonChart, DistributionChart};
use crate::AppState;

use super::ApiResponse;

pub async fn comparison(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ComparisonChart>>, AppError> {
    let chart = state.panel.comparison().await?;
    Ok(Json(ApiResponse::ok(chart)))
}

pub async fn distribution(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DistributionChart>>, AppError> {
    let chart = state.panel.distribution().await?;
    Ok(Json(ApiResponse::ok(chart)))
}
