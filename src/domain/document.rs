//! Client documents and their upload metadata

use super::common::{
    db_string_enum, deserialize_nullable, like_pattern, PageRequest, SortOrder, StringUuid,
    UserSummary,
};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentCategory {
    TaxDocuments,
    FinancialStatements,
    ComplianceDocs,
    Contracts,
    #[default]
    Others,
}

db_string_enum!(DocumentCategory {
    TaxDocuments => "TAX_DOCUMENTS",
    FinancialStatements => "FINANCIAL_STATEMENTS",
    ComplianceDocs => "COMPLIANCE_DOCS",
    Contracts => "CONTRACTS",
    Others => "OTHERS",
});

/// Document entity. `path` is the storage location and is not exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: StringUuid,
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i64,
    #[serde(skip_serializing, default)]
    pub path: String,
    pub category: DocumentCategory,
    pub description: Option<String>,
    pub client_id: StringUuid,
    pub uploaded_by_id: StringUuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentClient {
    pub id: StringUuid,
    pub name: String,
    pub email: String,
}

/// Document with its client and uploader
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: Document,
    pub client: DocumentClient,
    pub uploaded_by: UserSummary,
}

/// Text fields of the multipart upload form
#[derive(Debug, Clone, Default, Validate)]
pub struct DocumentUploadInput {
    #[validate(length(min = 1, message = "clientId is required"))]
    pub client_id: String,
    pub category: Option<DocumentCategory>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
}

/// A file received in an upload request, held in memory until stored
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub mimetype: String,
    pub data: Vec<u8>,
}

/// Longest original file name the `documents` table stores
pub const MAX_ORIGINAL_NAME_CHARS: usize = 255;
pub const MAX_MIMETYPE_CHARS: usize = 127;
const MAX_EXTENSION_CHARS: usize = 16;

impl UploadedFile {
    /// Reject file names and content types too long to record
    pub fn check_metadata(&self) -> Result<(), AppError> {
        if self.original_name.chars().count() > MAX_ORIGINAL_NAME_CHARS {
            return Err(AppError::BadRequest(format!(
                "File name must be at most {} characters",
                MAX_ORIGINAL_NAME_CHARS
            )));
        }
        if self.mimetype.chars().count() > MAX_MIMETYPE_CHARS {
            return Err(AppError::BadRequest(format!(
                "Content type of '{}' must be at most {} characters",
                self.original_name, MAX_MIMETYPE_CHARS
            )));
        }
        Ok(())
    }
}

/// Row to insert into `documents`
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: StringUuid,
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i64,
    pub path: String,
    pub category: DocumentCategory,
    pub description: Option<String>,
    pub client_id: StringUuid,
    pub uploaded_by_id: StringUuid,
}

/// Partial update. An explicit `"description": null` clears the description.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentInput {
    pub category: Option<DocumentCategory>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSortKey {
    #[default]
    CreatedAt,
    OriginalName,
    Size,
    Category,
}

/// Filters for listing documents across (or within) a CA's clients
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    pub owner_id: StringUuid,
    pub client_id: Option<StringUuid>,
    pub category: Option<DocumentCategory>,
    pub search: Option<String>,
    /// Whether the search also covers the client's name
    pub search_client_name: bool,
    pub sort_by: DocumentSortKey,
    pub sort_order: SortOrder,
    pub page: PageRequest,
}

impl DocumentFilter {
    pub fn new(owner_id: StringUuid) -> Self {
        Self {
            owner_id,
            client_id: None,
            category: None,
            search: None,
            search_client_name: true,
            sort_by: DocumentSortKey::default(),
            sort_order: SortOrder::default(),
            page: PageRequest::default(),
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn search_pattern(&self) -> Option<String> {
        self.search_term().map(like_pattern)
    }
}

/// File name extension (with the dot) of an uploaded file, lower-cased
pub fn file_extension(original_name: &str) -> Option<String> {
    let name = original_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(original_name);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => {
            let ext = &name[idx..];
            if ext.len() <= MAX_EXTENSION_CHARS + 1
                && ext[1..].chars().all(|c| c.is_ascii_alphanumeric())
            {
                Some(ext.to_ascii_lowercase())
            } else {
                None
            }
        }
        _ => None,
    }
}
