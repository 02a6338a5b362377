//! User accounts and role profiles

use super::common::{db_string_enum, StringUuid};
use crate::error::{AppError, FieldError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum UserRole {
    #[serde(rename = "CA")]
    Ca,
    #[serde(rename = "CLIENT")]
    Client,
}

db_string_enum!(UserRole {
    Ca => "CA",
    Client => "CLIENT",
});

/// User entity. The password hash never leaves the service boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: StringUuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaProfile {
    pub id: StringUuid,
    pub user_id: StringUuid,
    pub license_number: String,
    pub firm: String,
    pub experience: i32,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    pub id: StringUuid,
    pub user_id: StringUuid,
    pub company_name: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub address: Option<String>,
}

/// User with whichever role profile exists, as returned by login
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithProfile {
    #[serde(flatten)]
    pub user: User,
    pub ca_profile: Option<CaProfile>,
    pub client_profile: Option<ClientProfile>,
}

/// Minimal identity returned on registration
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RegisteredUser {
    pub id: StringUuid,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for RegisteredUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Registration request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "First name is required, at most 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required, at most 100 characters"))]
    pub last_name: String,
    pub role: UserRole,
    #[validate(length(max = 32, message = "Phone must be at most 32 characters"))]
    pub phone: Option<String>,
    pub is_active: Option<bool>,
    /// Role-specific profile; shape depends on `role`
    pub profile_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaProfileInput {
    #[validate(length(min = 1, max = 64, message = "License number is required, at most 64 characters"))]
    pub license_number: String,
    #[validate(length(min = 1, max = 255, message = "Firm is required, at most 255 characters"))]
    pub firm: String,
    #[validate(range(min = 0, message = "Experience cannot be negative"))]
    pub experience: i32,
    #[validate(length(max = 255, message = "Specialization must be at most 255 characters"))]
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfileInput {
    #[validate(length(max = 255, message = "Company name must be at most 255 characters"))]
    pub company_name: Option<String>,
    #[validate(length(max = 15, message = "GSTIN must be at most 15 characters"))]
    pub gstin: Option<String>,
    #[validate(length(max = 10, message = "PAN must be at most 10 characters"))]
    pub pan: Option<String>,
    #[validate(length(max = 2000, message = "Address must be at most 2000 characters"))]
    pub address: Option<String>,
}

/// Profile to create alongside a new user
#[derive(Debug, Clone, PartialEq)]
pub enum NewProfile {
    Ca(CaProfileInput),
    Client(ClientProfileInput),
}

impl RegisterInput {
    /// Interpret `profileData` according to `role`. A CA must supply a
    /// complete professional profile; a client profile is optional.
    pub fn profile(&self) -> Result<Option<NewProfile>, AppError> {
        match (self.role, &self.profile_data) {
            (UserRole::Ca, None) | (UserRole::Ca, Some(serde_json::Value::Null)) => {
                Err(AppError::invalid_field(
                    "profileData",
                    "required",
                    "CA profile: licenseNumber, firm and experience are required",
                ))
            }
            (UserRole::Ca, Some(value)) => {
                let input: CaProfileInput = serde_json::from_value(value.clone())
                    .map_err(|e| profile_error("CA profile", e))?;
                input.validate().map_err(|errors| {
                    nest_profile_errors(AppError::from(errors))
                })?;
                Ok(Some(NewProfile::Ca(input)))
            }
            (UserRole::Client, None) | (UserRole::Client, Some(serde_json::Value::Null)) => Ok(None),
            (UserRole::Client, Some(value)) => {
                let input: ClientProfileInput = serde_json::from_value(value.clone())
                    .map_err(|e| profile_error("Client profile", e))?;
                input.validate().map_err(|errors| {
                    nest_profile_errors(AppError::from(errors))
                })?;
                Ok(Some(NewProfile::Client(input)))
            }
        }
    }
}

fn profile_error(label: &str, err: serde_json::Error) -> AppError {
    AppError::invalid_field("profileData", "invalid", format!("{}: {}", label, err))
}

fn nest_profile_errors(err: AppError) -> AppError {
    match err {
        AppError::Validation(fields) => AppError::Validation(
            fields
                .into_iter()
                .map(|f| FieldError::new(format!("profileData.{}", f.field), f.code, f.message))
                .collect(),
        ),
        other => other,
    }
}

/// Login request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Row to insert into `users`, with the role profile created alongside it
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: StringUuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub profile: Option<NewProfile>,
}
