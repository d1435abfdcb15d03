use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use taxpal_core::calculations::{
    EstimateCalculator, QuarterlySchedule, ScenarioComparator, ScenarioComparison, ScenarioDelta,
    TaxEstimate, quarterly_schedule, tax_deadlines,
};
use tracing::debug;

use crate::error::ApiError;
use crate::response::{ApiResponse, UserId, YearQuery};
use crate::state::AppState;

pub async fn estimate(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    query: Result<Query<YearQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<TaxEstimate>>, ApiError> {
    let year = query?.resolve()?;

    let totals = state.year_totals(&user_id, year).await?;
    let estimate = EstimateCalculator::new(&state.table).estimate(&totals, year)?;
    debug!(user_id = %user_id, year, total_tax = %estimate.total_tax, "estimate computed");
    Ok(Json(ApiResponse::ok(estimate)))
}

/// Body of `POST /api/v1/tax/scenario`; omitted amounts are zero.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioRequest {
    pub year: Option<i32>,
    pub additional_income: Decimal,
    pub additional_expenses: Decimal,
    pub retirement_contribution: Decimal,
}

pub async fn scenario(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    body: Result<Json<ScenarioRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ScenarioComparison>>, ApiError> {
    let Json(request) = body?;
    let year = YearQuery { year: request.year }.resolve()?;
    let delta = ScenarioDelta {
        additional_income: request.additional_income,
        additional_expenses: request.additional_expenses,
        retirement_contribution: request.retirement_contribution,
    };

    let totals = state.year_totals(&user_id, year).await?;
    let comparison = ScenarioComparator::new(&state.table).compare(
        totals.total_income,
        totals.deductible_expenses,
        &delta,
    )?;
    Ok(Json(ApiResponse::ok(comparison)))
}

pub async fn quarterly(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    query: Result<Query<YearQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<QuarterlySchedule>>, ApiError> {
    let year = query?.resolve()?;

    let totals = state.year_totals(&user_id, year).await?;
    let estimate = EstimateCalculator::new(&state.table).estimate(&totals, year)?;
    let schedule = quarterly_schedule(estimate.total_tax, year)?;
    Ok(Json(ApiResponse::ok(schedule)))
}

pub async fn deadlines(
    UserId(_): UserId,
    query: Result<Query<YearQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let year = query?.resolve()?;

    let deadlines = tax_deadlines(year)?;
    Ok(Json(ApiResponse::ok(
        json!({ "year": year, "deadlines": deadlines }),
    )))
}
