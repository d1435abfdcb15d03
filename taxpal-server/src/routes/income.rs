use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::{Value, json};
use taxpal_core::{IncomeCategory, IncomeRecord, IncomeUpdate, LedgerQuery, NewIncome, Page};
use tracing::info;

use crate::error::ApiError;
use crate::response::{ApiResponse, UserId};
use crate::state::AppState;

const ENTITY: &str = "Income entry";

pub async fn list(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    query: Result<Query<LedgerQuery<IncomeCategory>>, QueryRejection>,
) -> Result<Json<ApiResponse<Page<IncomeRecord>>>, ApiError> {
    let Query(query) = query?;
    query.validate()?;

    let page = state.repo.list_income(&user_id, &query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let Path(id) = id?;

    let income = state
        .repo
        .get_income(&user_id, id)
        .await
        .map_err(|e| ApiError::from_repository(ENTITY, e))?;
    Ok(Json(ApiResponse::ok(json!({ "income": income }))))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    body: Result<Json<NewIncome>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), ApiError> {
    let Json(mut income) = body?;
    income.normalize();
    income.validate()?;

    let income = state.repo.create_income(&user_id, income).await?;
    info!(user_id = %user_id, id = income.id, amount = %income.amount, "income created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Income entry created successfully",
            json!({ "income": income }),
        )),
    ))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<IncomeUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let Path(id) = id?;
    let Json(update) = body?;
    update.validate()?;

    let income = state
        .repo
        .update_income(&user_id, id, update)
        .await
        .map_err(|e| ApiError::from_repository(ENTITY, e))?;
    info!(user_id = %user_id, id, "income updated");
    Ok(Json(ApiResponse::with_message(
        "Income entry updated successfully",
        json!({ "income": income }),
    )))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Path(id) = id?;

    state
        .repo
        .delete_income(&user_id, id)
        .await
        .map_err(|e| ApiError::from_repository(ENTITY, e))?;
    info!(user_id = %user_id, id, "income deleted");
    Ok(Json(ApiResponse::message("Income entry deleted successfully")))
}
