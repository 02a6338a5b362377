//! Caller identity and bearer-token parsing
//!
//! Provides:
//! - `AuthUser`, the identity attached to a request by `require_auth_middleware`
//! - the `AuthUser` extractor used by protected handlers

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{StringUuid, UserRole};
use crate::jwt::Claims;

/// Authenticated caller, taken from the verified token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: StringUuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Result<Self, AuthError> {
        let user_id = StringUuid::parse_str(&claims.id).map_err(|_| AuthError::InvalidToken)?;
        Ok(Self {
            user_id,
            role: claims.role,
        })
    }

    pub fn is_ca(&self) -> bool {
        self.role == UserRole::Ca
    }
}

/// Authentication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header present
    MissingToken,
    /// Wrong scheme, bad signature, expired or otherwise unusable token
    InvalidToken,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Not authorized, token missing",
            AuthError::InvalidToken => "Not authorized, invalid token",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "message": self.message(),
            })),
        )
            .into_response()
    }
}

/// Extract the Bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidToken),
    }
}

/// Axum extractor for the authenticated caller.
///
/// Reads the identity that `require_auth_middleware` stored in the request
/// extensions; routes outside that middleware always reject.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
