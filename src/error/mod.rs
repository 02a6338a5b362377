//! Unified error handling for CADesk Core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// A single schema violation, reported with the camelCase path of the
/// offending field (`profileData.licenseNumber`, `items[0].name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl AppError {
    /// Validation failure on one field
    pub fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, code, message)])
    }

    /// Path or query identifier that is not a UUID
    pub fn invalid_id() -> Self {
        AppError::BadRequest("Invalid ID provided".to_string())
    }
}

/// Error response body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl ErrorResponse {
    fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error,
            message: message.into(),
            errors: None,
            correlation_id: None,
        }
    }
}

/// Log the full error under a fresh correlation id and return a body that
/// carries only the id.
fn internal_error(detail: &dyn std::fmt::Debug) -> (StatusCode, ErrorResponse) {
    let correlation_id = Uuid::new_v4().to_string();
    tracing::error!(correlation_id = %correlation_id, error = ?detail, "Internal error");
    let mut body = ErrorResponse::new("internal_error", "Server error");
    body.correlation_id = Some(correlation_id);
    (StatusCode::INTERNAL_SERVER_ERROR, body)
}

fn database_error(err: &sqlx::Error) -> (StatusCode, ErrorResponse) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            ErrorResponse::new("not_found", "Record not found"),
        ),
        sqlx::Error::Database(db_err) => match db_err.kind() {
            sqlx::error::ErrorKind::UniqueViolation => {
                tracing::warn!("Unique constraint violated: {}", db_err.message());
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("duplicate_entry", "Duplicate entry found"),
                )
            }
            sqlx::error::ErrorKind::ForeignKeyViolation => {
                tracing::warn!("Foreign key constraint violated: {}", db_err.message());
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("foreign_key_violation", "Foreign key constraint failed"),
                )
            }
            _ => internal_error(err),
        },
        _ => internal_error(err),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new("not_found", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("bad_request", msg))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorResponse::new("unauthorized", msg))
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorResponse::new("forbidden", msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::new("conflict", msg)),
            AppError::Validation(errors) => {
                let mut body = ErrorResponse::new("validation_error", "Validation error");
                body.errors = Some(errors);
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::Database(e) => database_error(&e),
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {:?}", e);
                let body = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        ErrorResponse::new("token_expired", "Token expired")
                    }
                    _ => ErrorResponse::new("invalid_token", "Invalid token"),
                };
                (StatusCode::UNAUTHORIZED, body)
            }
            AppError::Storage(e) => internal_error(&e),
            AppError::Internal(e) => internal_error(&e),
        };

        (status, Json(body)).into_response()
    }
}

// Conversion from validation errors
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = Vec::new();
        flatten_validation_errors(&errors, "", &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
        AppError::Validation(fields)
    }
}

fn flatten_validation_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let name = to_camel_case(&field.to_string());
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{}.{}", prefix, name)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| default_message(&err.code));
                    out.push(FieldError::new(path.clone(), err.code.to_string(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(nested, &path, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

fn default_message(code: &str) -> String {
    match code {
        "email" => "Invalid email address".to_string(),
        "length" => "Invalid length".to_string(),
        "range" => "Value out of range".to_string(),
        "required" => "Field is required".to_string(),
        other => format!("Invalid value ({})", other),
    }
}

/// `license_number` -> `licenseNumber`
pub(crate) fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
