//! Compliance alert API handlers

use crate::api::{
    enum_filter, page_request, parse_id, parse_optional_id, sort_key, sort_order,
    MessageResponse, PaginatedResponse, SuccessResponse,
};
use crate::domain::{AlertFilter, CreateAlertInput, SortOrder, UpdateAlertInput};
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, ValidatedJson};
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

/// Upper bound for `upcoming`, roughly ten years
const MAX_UPCOMING_DAYS: u32 = 3650;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub client_id: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub upcoming: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl AlertListQuery {
    fn into_filter(self, auth: &AuthUser) -> Result<AlertFilter> {
        let filter = AlertFilter {
            client_id: parse_optional_id(self.client_id.as_deref())?,
            status: enum_filter("status", self.status.as_deref())?,
            priority: enum_filter("priority", self.priority.as_deref())?,
            search: self.search,
            sort_by: sort_key(self.sort_by.as_deref()),
            sort_order: sort_order(self.sort_order.as_deref(), SortOrder::Asc),
            page: page_request(self.page.as_deref(), self.limit.as_deref()),
            ..AlertFilter::new(auth.user_id)
        };

        match self.upcoming.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(filter),
            Some(raw) => {
                let days: u32 = raw.parse().map_err(|_| {
                    AppError::invalid_field(
                        "upcoming",
                        "number",
                        "upcoming must be a whole number of days",
                    )
                })?;
                Ok(filter.upcoming(Utc::now(), days.min(MAX_UPCOMING_DAYS)))
            }
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/compliance/create",
    tag = "Compliance",
    request_body = CreateAlertInput,
    responses(
        (status = 201, description = "Alert created as PENDING"),
        (status = 404, description = "Client not found or not owned")
    )
)]
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateAlertInput>,
) -> Result<impl IntoResponse> {
    let alert = state.compliance_service().create(auth.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Compliance alert created successfully", alert)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/compliance/getAlert/{id}",
    tag = "Compliance",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert"),
        (status = 404, description = "Compliance alert not found")
    )
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let alert = state
        .compliance_service()
        .get(auth.user_id, parse_id(&id)?)
        .await?;
    Ok(Json(SuccessResponse::new("Compliance alert retrieved successfully", alert)))
}

#[utoipa::path(
    patch,
    path = "/api/compliance/update/{id}",
    tag = "Compliance",
    params(("id" = String, Path, description = "Alert id")),
    request_body = UpdateAlertInput,
    responses(
        (status = 200, description = "Alert updated"),
        (status = 404, description = "Compliance alert not found")
    )
)]
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateAlertInput>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let alert = state
        .compliance_service()
        .update(auth.user_id, id, input)
        .await?;
    Ok(Json(SuccessResponse::new("Compliance alert updated successfully", alert)))
}

#[utoipa::path(
    delete,
    path = "/api/compliance/delete/{id}",
    tag = "Compliance",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert deleted", body = MessageResponse),
        (status = 404, description = "Compliance alert not found")
    )
)]
/// Mounted for both PATCH and DELETE
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state
        .compliance_service()
        .delete(auth.user_id, parse_id(&id)?)
        .await?;
    Ok(Json(MessageResponse::new("Compliance alert deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/compliance/getAlerts",
    tag = "Compliance",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("limit" = Option<i64>, Query, description = "Page size, at most 100"),
        ("clientId" = Option<String>, Query, description = "Only this client's alerts"),
        ("status" = Option<String>, Query, description = "Status filter, or `all`"),
        ("priority" = Option<String>, Query, description = "Priority filter, or `all`"),
        ("upcoming" = Option<u32>, Query, description = "Pending alerts due within this many days")
    ),
    responses((status = 200, description = "Page of alerts with daysUntilDue"))
)]
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<AlertListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.into_filter(&auth)?;
    let (alerts, total) = state.compliance_service().list(&filter).await?;
    Ok(Json(PaginatedResponse::new(
        "Compliance alerts retrieved successfully",
        alerts,
        filter.page,
        total,
    )))
}
