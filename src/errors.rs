use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::EstimationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, ApiError>`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid meal type")]
    InvalidMealType,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing or invalid fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Malformed estimation response: {0}")]
    MalformedResponse(String),

    #[error("Estimation service error: {0}")]
    Estimation(#[from] EstimationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match &self {
            ApiError::InvalidMealType => (
                StatusCode::BAD_REQUEST,
                "INVALID_MEAL_TYPE",
                "Invalid meal type".to_string(),
                None,
            ),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            ApiError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Missing or invalid fields".to_string(),
                Some(fields.clone()),
            ),
            ApiError::MalformedResponse(detail) => {
                tracing::error!("malformed estimation response: {detail}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_RESPONSE",
                    "The estimation service returned an unusable response".to_string(),
                    None,
                )
            }
            ApiError::Estimation(e) => {
                tracing::error!("estimation service error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ESTIMATION_UNAVAILABLE",
                    "The estimation service is unavailable".to_string(),
                    None,
                )
            }
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{what} not found"),
                None,
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                None,
            ),
            ApiError::Conflict(msg) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None)
            }
            ApiError::Database(e) => {
                tracing::error!("database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(fields) = fields {
            error["fields"] = json!(fields);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_offenders_in_message() {
        let err = ApiError::MissingFields(vec!["calories_min".into(), "sugar_max".into()]);
        let msg = err.to_string();
        assert!(msg.contains("calories_min"));
        assert!(msg.contains("sugar_max"));
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = ApiError::NotFound("Meal".into());
        assert_eq!(err.to_string(), "Not found: Meal");
    }
}
