mod dashboard;
mod expenses;
mod income;
mod reports;
mod tax;

use std::sync::Arc;

use axum::{Json, Router, routing::get, routing::post};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use tax::ScenarioRequest;

/// Builds the HTTP API.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Ledger
        .route("/api/v1/income", get(income::list).post(income::create))
        .route(
            "/api/v1/income/{id}",
            get(income::get_one)
                .put(income::update)
                .delete(income::delete),
        )
        .route(
            "/api/v1/expenses",
            get(expenses::list).post(expenses::create),
        )
        .route(
            "/api/v1/expenses/{id}",
            get(expenses::get_one)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        // Tax engine
        .route("/api/v1/tax/estimate", get(tax::estimate))
        .route("/api/v1/tax/scenario", post(tax::scenario))
        .route("/api/v1/tax/quarterly", get(tax::quarterly))
        .route("/api/v1/tax/deadlines", get(tax::deadlines))
        // Reports
        .route("/api/v1/reports/annual", get(reports::annual))
        .route("/api/v1/reports/summary", get(reports::summary))
        .route("/api/v1/dashboard/overview", get(dashboard::overview))
        .route("/api/v1/dashboard/trends", get(dashboard::trends))
        .route("/api/v1/dashboard/summary", get(dashboard::summary))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    timestamp: DateTime<Utc>,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "OK",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
