//! Document API handlers

use crate::api::{
    enum_filter, page_request, parse_id, sort_key, sort_order, MessageResponse,
    PaginatedResponse, SuccessResponse,
};
use crate::domain::{
    DocumentCategory, DocumentClient, DocumentFilter, DocumentUploadInput, DocumentView,
    SortOrder, UpdateDocumentInput, UploadedFile,
};
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, ValidatedJson};
use crate::state::HasServices;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

/// Multipart part carrying the files
const FILES_FIELD: &str = "documents";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl DocumentListQuery {
    fn into_filter(self, auth: &AuthUser) -> Result<DocumentFilter> {
        Ok(DocumentFilter {
            category: enum_filter("category", self.category.as_deref())?,
            search: self.search,
            sort_by: sort_key(self.sort_by.as_deref()),
            sort_order: sort_order(self.sort_order.as_deref(), SortOrder::Desc),
            page: page_request(self.page.as_deref(), self.limit.as_deref()),
            ..DocumentFilter::new(auth.user_id)
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UploadedDocuments {
    pub documents: Vec<DocumentView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClientDocuments {
    pub client: DocumentClient,
    pub documents: Vec<DocumentView>,
}

fn multipart_error(err: MultipartError) -> AppError {
    tracing::debug!(error = %err.body_text(), "Rejected multipart body");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::BadRequest("Upload exceeds the maximum request size".to_string())
    } else {
        AppError::BadRequest("Invalid multipart form data".to_string())
    }
}

/// Split the form into its text fields and files. Parts other than
/// `documents`, `clientId`, `category` and `description` are ignored.
async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(DocumentUploadInput, Vec<UploadedFile>)> {
    let mut input = DocumentUploadInput::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILES_FIELD => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let mimetype = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                files.push(UploadedFile {
                    original_name,
                    mimetype,
                    data: data.to_vec(),
                });
            }
            "clientId" => input.client_id = field.text().await.map_err(multipart_error)?,
            "category" => {
                let text = field.text().await.map_err(multipart_error)?;
                input.category = enum_filter::<DocumentCategory>("category", Some(&text))?;
            }
            "description" => {
                let text = field.text().await.map_err(multipart_error)?;
                input.description = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    Ok((input, files))
}

#[utoipa::path(
    post,
    path = "/api/documents/upload",
    tag = "Documents",
    request_body(content_type = "multipart/form-data", description = "`documents` files plus clientId, category, description"),
    responses(
        (status = 201, description = "Documents uploaded"),
        (status = 400, description = "No files, too many files or a file too large"),
        (status = 404, description = "Client not found")
    )
)]
pub async fn upload<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (input, files) = read_upload_form(multipart).await?;
    let documents = state
        .document_service()
        .upload(auth.user_id, input, files)
        .await?;

    let count = documents.len();
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(
            format!("{} document(s) uploaded successfully", count),
            UploadedDocuments { documents, count },
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/documents/getDocument/{clientId}",
    tag = "Documents",
    params(("clientId" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "The client and a page of its documents"),
        (status = 404, description = "Client not found")
    )
)]
pub async fn list_for_client<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(client_id): Path<String>,
    Query(query): Query<DocumentListQuery>,
) -> Result<impl IntoResponse> {
    let client_id = parse_id(&client_id)?;
    let filter = query.into_filter(&auth)?;
    let page = filter.page;

    let (client, documents, total) = state
        .document_service()
        .list_for_client(client_id, filter)
        .await?;

    Ok(Json(PaginatedResponse::new(
        "Documents retrieved successfully",
        ClientDocuments { client, documents },
        page,
        total,
    )))
}

#[utoipa::path(
    get,
    path = "/api/documents/getAllDocuments",
    tag = "Documents",
    params(
        ("page" = Option<i64>, Query, description = "Page number, from 1"),
        ("limit" = Option<i64>, Query, description = "Page size, at most 100"),
        ("category" = Option<String>, Query, description = "Category filter, or `all`"),
        ("search" = Option<String>, Query, description = "File name, description or client name")
    ),
    responses((status = 200, description = "Page of documents"))
)]
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<DocumentListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.into_filter(&auth)?;
    let (documents, total) = state.document_service().list(&filter).await?;
    Ok(Json(PaginatedResponse::new(
        "Documents retrieved successfully",
        documents,
        filter.page,
        total,
    )))
}

#[utoipa::path(
    get,
    path = "/api/documents/getDocumentById/{id}",
    tag = "Documents",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let document = state
        .document_service()
        .get(auth.user_id, parse_id(&id)?)
        .await?;
    Ok(Json(SuccessResponse::new("Document retrieved successfully", document)))
}

#[utoipa::path(
    patch,
    path = "/api/documents/updateDocument/{id}",
    tag = "Documents",
    params(("id" = String, Path, description = "Document id")),
    request_body = UpdateDocumentInput,
    responses(
        (status = 200, description = "Document updated"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateDocumentInput>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let document = state
        .document_service()
        .update(auth.user_id, id, input)
        .await?;
    Ok(Json(SuccessResponse::new("Document updated successfully", document)))
}

#[utoipa::path(
    delete,
    path = "/api/documents/deleteDocument/{id}",
    tag = "Documents",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document deleted", body = MessageResponse),
        (status = 404, description = "Document not found")
    )
)]
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state
        .document_service()
        .delete(auth.user_id, parse_id(&id)?)
        .await?;
    Ok(Json(MessageResponse::new("Document deleted successfully")))
}
