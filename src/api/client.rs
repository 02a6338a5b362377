//! Client API handlers

use crate::api::{
    flag, page_request, parse_id, parse_optional_id, sort_key, sort_order, MessageResponse,
    PaginatedResponse, SuccessResponse,
};
use crate::domain::{ClientFilter, CreateClientInput, SortOrder, UpdateClientInput};
use crate::error::Result;
use crate::middleware::{AuthUser, ValidatedJson};
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

/// Query string of `GET /api/clients/getClients`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub id: Option<String>,
    pub search: Option<String>,
    pub include_inactive: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ClientListQuery {
    fn into_filter(self, auth: &AuthUser) -> Result<ClientFilter> {
        Ok(ClientFilter {
            id: parse_optional_id(self.id.as_deref())?,
            search: self.search,
            include_inactive: flag(self.include_inactive.as_deref()),
            sort_by: sort_key(self.sort_by.as_deref()),
            sort_order: sort_order(self.sort_order.as_deref(), SortOrder::Desc),
            page: page_request(self.page.as_deref(), self.limit.as_deref()),
            ..ClientFilter::new(auth.user_id)
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/clients/createClient",
    tag = "Clients",
    request_body = CreateClientInput,
    responses(
        (status = 201, description = "Client created"),
        (status = 400, description = "Validation error or duplicate email")
    )
)]
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateClientInput>,
) -> Result<impl IntoResponse> {
    let client = state.client_service().create(auth.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Client created successfully", client)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/clients/getClient/{id}",
    tag = "Clients",
    params(("id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client"),
        (status = 404, description = "Client not found")
    )
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let client = state.client_service().get(auth.user_id, parse_id(&id)?).await?;
    Ok(Json(SuccessResponse::new("Client retrieved successfully", client)))
}

#[utoipa::path(
    put,
    path = "/api/clients/updateClient/{id}",
    tag = "Clients",
    params(("id" = String, Path, description = "Client id")),
    request_body = UpdateClientInput,
    responses(
        (status = 200, description = "Client updated"),
        (status = 404, description = "Client not found")
    )
)]
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateClientInput>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let client = state.client_service().update(auth.user_id, id, input).await?;
    Ok(Json(SuccessResponse::new("Client updated successfully", client)))
}

#[utoipa::path(
    delete,
    path = "/api/clients/delete/{id}",
    tag = "Clients",
    params(("id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client deactivated", body = MessageResponse),
        (status = 404, description = "Client not found")
    )
)]
/// Soft delete
pub async fn deactivate<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state
        .client_service()
        .deactivate(auth.user_id, parse_id(&id)?)
        .await?;
    Ok(Json(MessageResponse::new("Client deactivated successfully")))
}

#[utoipa::path(
    post,
    path = "/api/clients/restore/{id}",
    tag = "Clients",
    params(("id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client restored"),
        (status = 404, description = "Deactivated client not found")
    )
)]
pub async fn restore<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let client = state
        .client_service()
        .restore(auth.user_id, parse_id(&id)?)
        .await?;
    Ok(Json(SuccessResponse::new("Client restored successfully", client)))
}

#[utoipa::path(
    get,
    path = "/api/clients/getClients",
    tag = "Clients",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("limit" = Option<i64>, Query, description = "Page size, at most 100"),
        ("id" = Option<String>, Query, description = "Only this client"),
        ("search" = Option<String>, Query, description = "Name, email or company"),
        ("includeInactive" = Option<bool>, Query, description = "Also list deactivated clients")
    ),
    responses((status = 200, description = "Page of clients"))
)]
/// Active clients of the caller unless `includeInactive=true`
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<ClientListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.into_filter(&auth)?;
    let (clients, total) = state.client_service().list(&filter).await?;
    Ok(Json(PaginatedResponse::new(
        "Clients retrieved successfully",
        clients,
        filter.page,
        total,
    )))
}
