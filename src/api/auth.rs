//! Registration and login handlers

use crate::api::SuccessResponse;
use crate::domain::{LoginInput, RegisterInput};
use crate::error::Result;
use crate::middleware::ValidatedJson;
use crate::state::HasServices;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// `data` of both auth responses
#[derive(Debug, Serialize)]
pub struct AuthPayload<U> {
    pub user: U,
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterInput,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Validation error or user already exists")
    )
)]
/// Create an account (and its role profile) and sign it in
pub async fn register<S: HasServices>(
    State(state): State<S>,
    ValidatedJson(input): ValidatedJson<RegisterInput>,
) -> Result<impl IntoResponse> {
    let (user, token) = state.auth_service().register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(
            "User registered successfully",
            AuthPayload { user, token },
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Signed in"),
        (status = 401, description = "Invalid credentials or account deactivated")
    )
)]
pub async fn login<S: HasServices>(
    State(state): State<S>,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> Result<impl IntoResponse> {
    let (user, token) = state.auth_service().login(input).await?;
    Ok(Json(SuccessResponse::new(
        "Login successful",
        AuthPayload { user, token },
    )))
}
