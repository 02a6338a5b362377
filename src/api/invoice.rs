//! Invoice API handlers

use crate::api::{
    enum_filter, page_request, parse_id, parse_optional_id, sort_key, sort_order,
    MessageResponse, PaginatedResponse, SuccessResponse,
};
use crate::domain::{CreateInvoiceInput, InvoiceFilter, SortOrder, UpdateInvoiceInput};
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

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub client_id: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl InvoiceListQuery {
    fn into_filter(self, auth: &AuthUser) -> Result<InvoiceFilter> {
        Ok(InvoiceFilter {
            client_id: parse_optional_id(self.client_id.as_deref())?,
            status: enum_filter("status", self.status.as_deref())?,
            search: self.search,
            sort_by: sort_key(self.sort_by.as_deref()),
            sort_order: sort_order(self.sort_order.as_deref(), SortOrder::Desc),
            page: page_request(self.page.as_deref(), self.limit.as_deref()),
            ..InvoiceFilter::new(auth.user_id)
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/invoices/createInvoice",
    tag = "Invoices",
    request_body = CreateInvoiceInput,
    responses(
        (status = 201, description = "Invoice created with the next number of the month"),
        (status = 404, description = "Client not found or not owned")
    )
)]
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateInvoiceInput>,
) -> Result<impl IntoResponse> {
    let invoice = state.invoice_service().create(auth.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Invoice created successfully", invoice)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/invoices/getInvoice/{id}",
    tag = "Invoices",
    params(("id" = String, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice"),
        (status = 404, description = "Invoice not found")
    )
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let invoice = state
        .invoice_service()
        .get(auth.user_id, parse_id(&id)?)
        .await?;
    Ok(Json(SuccessResponse::new("Invoice retrieved successfully", invoice)))
}

#[utoipa::path(
    get,
    path = "/api/invoices/getAllInvoices",
    tag = "Invoices",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("limit" = Option<i64>, Query, description = "Page size, at most 100"),
        ("status" = Option<String>, Query, description = "Status filter, or `all`"),
        ("clientId" = Option<String>, Query, description = "Only this client's invoices"),
        ("search" = Option<String>, Query, description = "Number, description or client name")
    ),
    responses((status = 200, description = "Page of invoices"))
)]
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<InvoiceListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.into_filter(&auth)?;
    let (invoices, total) = state.invoice_service().list(&filter).await?;
    Ok(Json(PaginatedResponse::new(
        "Invoices retrieved successfully",
        invoices,
        filter.page,
        total,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/invoices/updateInvoice/{id}",
    tag = "Invoices",
    params(("id" = String, Path, description = "Invoice id")),
    request_body = UpdateInvoiceInput,
    responses(
        (status = 200, description = "Invoice updated, total recomputed"),
        (status = 404, description = "Invoice not found")
    )
)]
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateInvoiceInput>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let invoice = state
        .invoice_service()
        .update(auth.user_id, id, input)
        .await?;
    Ok(Json(SuccessResponse::new("Invoice updated successfully", invoice)))
}

#[utoipa::path(
    delete,
    path = "/api/invoices/deleteInvoice/{id}",
    tag = "Invoices",
    params(("id" = String, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice deleted", body = MessageResponse),
        (status = 400, description = "Only draft invoices can be deleted"),
        (status = 404, description = "Invoice not found")
    )
)]
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state
        .invoice_service()
        .delete(auth.user_id, parse_id(&id)?)
        .await?;
    Ok(Json(MessageResponse::new("Invoice deleted successfully")))
}
