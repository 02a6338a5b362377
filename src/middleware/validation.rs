//! JSON body extraction with schema validation
//!
//! `ValidatedJson<T>` decodes the body and runs `T::validate()`. Any
//! decoding problem is reported in the same `Validation error` envelope as
//! rule failures, keyed by the camelCase path of the offending field.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, FieldError};

lazy_static::lazy_static! {
    /// `<path>: <serde message>` as produced by axum's JSON extractor
    static ref DATA_ERROR: regex::Regex =
        regex::Regex::new(r"^(?:.*?target type: )?(?:(?P<path>[^\s:]+): )?(?P<msg>.*?)(?: at line \d+ column \d+)?$").unwrap();
    static ref MISSING_FIELD: regex::Regex = regex::Regex::new(r"missing field `([^`]+)`").unwrap();
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => AppError::Validation(vec![data_error(&e.body_text())]),
        JsonRejection::JsonSyntaxError(_) => {
            AppError::invalid_field("body", "json", "Malformed JSON body")
        }
        JsonRejection::MissingJsonContentType(_) => AppError::invalid_field(
            "body",
            "content_type",
            "Expected request with `Content-Type: application/json`",
        ),
        other => {
            tracing::debug!(error = %other.body_text(), "Unreadable request body");
            AppError::BadRequest("Invalid request body".to_string())
        }
    }
}

/// Turn a serde data error into a field error. Parser positions are dropped.
fn data_error(text: &str) -> FieldError {
    let (path, message) = match DATA_ERROR.captures(text.trim()) {
        Some(caps) => (
            caps.name("path").map(|m| m.as_str()).unwrap_or("."),
            caps.name("msg").map(|m| m.as_str()).unwrap_or(text),
        ),
        None => (".", text),
    };

    if let Some(missing) = MISSING_FIELD.captures(message) {
        let field = &missing[1];
        let full = if path == "." {
            field.to_string()
        } else {
            format!("{}.{}", path, field)
        };
        return FieldError::new(full, "required", format!("{} is required", field));
    }

    let field = if path == "." { "body" } else { path };
    let code = if message.starts_with("unknown variant") {
        "enum"
    } else {
        "type"
    };
    FieldError::new(field, code, message)
}
