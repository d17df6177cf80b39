//! Error types for the Explore Events server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::models::datetime;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Validation(String),

    /// Body validation failures, one message per field error
    #[error("{}", .0.join("; "))]
    InvalidFields(Vec<String>),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        // Unique / foreign-key violations are business conflicts, not outages
        if let sqlx::Error::Database(ref db) = e {
            if db.is_unique_violation() || db.is_foreign_key_violation() {
                return AppError::Conflict(db.message().to_string());
            }
        }
        AppError::Database(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut errors: Vec<String> = e
            .field_errors()
            .into_iter()
            .flat_map(|(field, list)| {
                list.iter().map(move |err| {
                    let detail = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    format!("Field: {}. Error: {}", field, detail)
                })
            })
            .collect();
        // Nested struct errors carry no top-level field entry
        if errors.is_empty() {
            errors.push(e.to_string());
        }
        errors.sort();
        AppError::InvalidFields(errors)
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// HTTP status name (e.g. `CONFLICT`)
    pub status: String,
    /// Short, kind-level explanation
    pub reason: String,
    pub message: String,
    pub errors: Vec<String>,
    #[serde(with = "datetime")]
    #[schema(value_type = String, example = "2024-01-01 12:00:00")]
    pub timestamp: NaiveDateTime,
}

impl AppError {
    fn status_and_reason(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "The required object was not found."),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Integrity constraint has been violated."),
            AppError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "Invalid request parameters."),
            AppError::Validation(_) | AppError::InvalidFields(_) => {
                (StatusCode::BAD_REQUEST, "Incorrectly made request.")
            }
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, reason) = self.status_and_reason();
        let errors = match &self {
            AppError::InvalidFields(errors) => errors.clone(),
            _ => Vec::new(),
        };

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => {
                tracing::debug!("Request rejected ({}): {}", status, other);
                other.to_string()
            }
        };

        let body = Json(ErrorResponse {
            status: status
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_uppercase()
                .replace(' ', "_"),
            reason: reason.to_string(),
            message,
            errors,
            timestamp: datetime::now(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::NotFound("x".into()).status_and_reason().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_and_reason().0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidArgument("x".into()).status_and_reason().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("x".into()).status_and_reason().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_is_passed_through() {
        let err = AppError::Conflict("The participant limit has been reached.".into());
        assert_eq!(err.to_string(), "The participant limit has been reached.");
    }

    #[test]
    fn test_validation_errors_list_each_field() {
        use validator::Validate;

        #[derive(Validate)]
        struct Body {
            #[validate(length(min = 3, message = "too short"))]
            name: String,
            #[validate(range(min = 0))]
            limit: i32,
        }

        let body = Body {
            name: "ab".into(),
            limit: -1,
        };
        let err: AppError = body.validate().unwrap_err().into();
        assert_eq!(err.status_and_reason().0, StatusCode::BAD_REQUEST);
        match err {
            AppError::InvalidFields(errors) => assert_eq!(
                errors,
                vec![
                    "Field: limit. Error: range".to_string(),
                    "Field: name. Error: too short".to_string(),
                ]
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Database(_)));
    }
}
