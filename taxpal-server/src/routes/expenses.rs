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
use taxpal_core::{ExpenseCategory, ExpenseRecord, ExpenseUpdate, LedgerQuery, NewExpense, Page};
use tracing::info;

use crate::error::ApiError;
use crate::response::{ApiResponse, UserId};
use crate::state::AppState;

const ENTITY: &str = "Expense entry";

pub async fn list(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    query: Result<Query<LedgerQuery<ExpenseCategory>>, QueryRejection>,
) -> Result<Json<ApiResponse<Page<ExpenseRecord>>>, ApiError> {
    let Query(query) = query?;
    query.validate()?;

    let page = state.repo.list_expenses(&user_id, &query).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let Path(id) = id?;

    let expense = state
        .repo
        .get_expense(&user_id, id)
        .await
        .map_err(|e| ApiError::from_repository(ENTITY, e))?;
    Ok(Json(ApiResponse::ok(json!({ "expense": expense }))))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    body: Result<Json<NewExpense>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), ApiError> {
    let Json(mut expense) = body?;
    expense.normalize();
    expense.validate()?;

    let expense = state.repo.create_expense(&user_id, expense).await?;
    info!(user_id = %user_id, id = expense.id, amount = %expense.amount, "expense created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Expense entry created successfully",
            json!({ "expense": expense }),
        )),
    ))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ExpenseUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let Path(id) = id?;
    let Json(update) = body?;
    update.validate()?;

    let expense = state
        .repo
        .update_expense(&user_id, id, update)
        .await
        .map_err(|e| ApiError::from_repository(ENTITY, e))?;
    info!(user_id = %user_id, id, "expense updated");
    Ok(Json(ApiResponse::with_message(
        "Expense entry updated successfully",
        json!({ "expense": expense }),
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
        .delete_expense(&user_id, id)
        .await
        .map_err(|e| ApiError::from_repository(ENTITY, e))?;
    info!(user_id = %user_id, id, "expense deleted");
    Ok(Json(ApiResponse::message("Expense entry deleted successfully")))
}
