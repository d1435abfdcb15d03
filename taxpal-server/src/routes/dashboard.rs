use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::Local;
use taxpal_core::calculations::{self, DashboardOverview, DashboardSummary, MonthlyTrends};

use crate::error::ApiError;
use crate::response::{ApiResponse, UserId, YearQuery};
use crate::state::AppState;

pub async fn overview(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    query: Result<Query<YearQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<DashboardOverview>>, ApiError> {
    let year = query?.resolve()?;

    let (incomes, expenses) = state.year_ledger(&user_id, year).await?;
    let overview = calculations::overview(&state.table, year, &incomes, &expenses)?;
    Ok(Json(ApiResponse::ok(overview)))
}

pub async fn trends(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    query: Result<Query<YearQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<MonthlyTrends>>, ApiError> {
    let year = query?.resolve()?;

    let (incomes, expenses) = state.year_ledger(&user_id, year).await?;
    let trends = calculations::monthly_trends(year, &incomes, &expenses)?;
    Ok(Json(ApiResponse::ok(trends)))
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    let (incomes, expenses) = state.full_ledger(&user_id).await?;
    let today = Local::now().date_naive();

    let summary = calculations::summary(&state.table, today, &incomes, &expenses)?;
    Ok(Json(ApiResponse::ok(summary)))
}
