use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::Utc;
use taxpal_core::calculations::{AnnualReport, ReportGenerator, YearOverYearSummary, year_over_year};

use crate::error::ApiError;
use crate::response::{ApiResponse, UserId, YearQuery};
use crate::state::AppState;

pub async fn annual(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    query: Result<Query<YearQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<AnnualReport>>, ApiError> {
    let year = query?.resolve()?;

    let (incomes, expenses) = state.year_ledger(&user_id, year).await?;
    let report = ReportGenerator::new(&state.table).annual(year, &incomes, &expenses, Utc::now())?;
    Ok(Json(ApiResponse::ok(report)))
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    query: Result<Query<YearQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<YearOverYearSummary>>, ApiError> {
    let year = query?.resolve()?;

    let current = state.year_totals(&user_id, year).await?;
    let previous = state.year_totals(&user_id, year - 1).await?;
    Ok(Json(ApiResponse::ok(year_over_year(year, &current, &previous))))
}
