//! Response envelope and request extractors shared by every route.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const MIN_YEAR: i32 = 2020;
pub const MAX_YEAR: i32 = 2030;

/// `{ "success": true, "message"?: ..., "data"?: ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(
        message: impl Into<String>,
        data: T,
    ) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Caller identity from the `x-user-id` header, set by the authenticating
/// proxy in front of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| UserId(id.to_string()))
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {USER_ID_HEADER} header")))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

impl YearQuery {
    /// The requested year, or the current one.
    pub fn resolve(&self) -> Result<i32, ApiError> {
        let year = self.year.unwrap_or_else(|| Local::now().year());
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ApiError::BadRequest(format!(
                "Year must be between {MIN_YEAR} and {MAX_YEAR}"
            )));
        }
        Ok(year)
    }
}
