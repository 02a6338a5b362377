//! Client records owned by a CA

use super::common::{
    deserialize_nullable, like_pattern, PageRequest, SortOrder, StringUuid, UserSummary,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Client entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: StringUuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_by_id: StringUuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client with its owning CA
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    #[serde(flatten)]
    pub client: Client,
    pub created_by: UserSummary,
}

/// Summary attached to a per-client document listing
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub id: StringUuid,
    pub name: String,
    pub email: String,
    pub company_name: Option<String>,
}

impl From<&Client> for ClientSummary {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id,
            name: client.name.clone(),
            email: client.email.clone(),
            company_name: client.company_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientInput {
    #[validate(length(min = 1, max = 255, message = "Name is required, at most 255 characters"))]
    pub name: String,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,
    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "Company name must be at most 255 characters"))]
    pub company_name: Option<String>,
    #[validate(length(max = 15, message = "GSTIN must be at most 15 characters"))]
    pub gstin: Option<String>,
    #[validate(length(max = 10, message = "PAN must be at most 10 characters"))]
    pub pan: Option<String>,
    #[validate(length(max = 2000, message = "Address must be at most 2000 characters"))]
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial update; absent fields keep their stored value and an explicit
/// `null` clears an optional field
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientInput {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty, at most 255 characters"))]
    pub name: Option<String>,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[validate(length(max = 255, message = "Company name must be at most 255 characters"))]
    #[schema(value_type = Option<String>)]
    pub company_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[validate(length(max = 15, message = "GSTIN must be at most 15 characters"))]
    #[schema(value_type = Option<String>)]
    pub gstin: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[validate(length(max = 10, message = "PAN must be at most 10 characters"))]
    #[schema(value_type = Option<String>)]
    pub pan: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[validate(length(max = 2000, message = "Address must be at most 2000 characters"))]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
}

/// Resolve a nullable patch field against its stored value
pub fn patch_nullable<'a>(
    patch: &'a Option<Option<String>>,
    current: &'a Option<String>,
) -> Option<&'a String> {
    match patch {
        Some(value) => value.as_ref(),
        None => current.as_ref(),
    }
}

/// Whitelisted sort columns for the client list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientSortKey {
    #[default]
    CreatedAt,
    Name,
    Email,
    CompanyName,
}

/// Filters for listing one CA's clients
#[derive(Debug, Clone)]
pub struct ClientFilter {
    pub owner_id: StringUuid,
    pub id: Option<StringUuid>,
    pub search: Option<String>,
    pub include_inactive: bool,
    pub sort_by: ClientSortKey,
    pub sort_order: SortOrder,
    pub page: PageRequest,
}

impl ClientFilter {
    pub fn new(owner_id: StringUuid) -> Self {
        Self {
            owner_id,
            id: None,
            search: None,
            include_inactive: false,
            sort_by: ClientSortKey::default(),
            sort_order: SortOrder::default(),
            page: PageRequest::default(),
        }
    }

    /// Trimmed search term, if a non-blank one was given
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn search_pattern(&self) -> Option<String> {
        self.search_term().map(like_pattern)
    }
}
