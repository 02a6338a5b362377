//! Invoices issued by a CA to a client

use super::common::{
    db_string_enum, deserialize_nullable, like_pattern, validate_date_input, PageRequest,
    SortOrder, StringUuid,
};
use crate::error::AppError;
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

db_string_enum!(InvoiceStatus {
    Draft => "DRAFT",
    Sent => "SENT",
    Paid => "PAID",
    Overdue => "OVERDUE",
    Cancelled => "CANCELLED",
});

impl InvoiceStatus {
    /// Only drafts may be removed; anything sent has left the building.
    pub fn is_deletable(&self) -> bool {
        matches!(self, InvoiceStatus::Draft)
    }
}

/// Invoice entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: StringUuid,
    pub invoice_number: String,
    pub client_id: StringUuid,
    pub issued_by_id: StringUuid,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[schema(value_type = f64)]
    pub tax: Decimal,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Billing contact details of the invoiced client
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceClient {
    pub id: StringUuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub gstin: Option<String>,
    pub pan: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuerFirm {
    pub firm: String,
    pub license_number: String,
}

/// The CA who issued the invoice
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceIssuer {
    pub id: StringUuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub ca_profile: Option<IssuerFirm>,
}

/// Invoice with client and issuer details
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub client: InvoiceClient,
    pub issued_by: InvoiceIssuer,
}

/// Money columns are `DECIMAL(12, 2)`
const MONEY_SCALE: u32 = 2;

/// Largest value a money column holds: 9,999,999,999.99
pub fn max_money() -> Decimal {
    Decimal::new(999_999_999_999, MONEY_SCALE)
}

fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("range").with_message("Must not be negative".into()));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::new("scale")
            .with_message("Must have at most 2 decimal places".into()));
    }
    if *value > max_money() {
        return Err(ValidationError::new("range")
            .with_message("Must not exceed 9999999999.99".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceInput {
    #[validate(length(min = 1, message = "clientId is required"))]
    pub client_id: String,
    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = Option<f64>)]
    pub tax: Option<Decimal>,
    #[validate(custom(function = "validate_date_input"))]
    pub due_date: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    pub status: Option<InvoiceStatus>,
}

/// Partial update. Amount and tax changes recompute the total.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceInput {
    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = Option<f64>)]
    pub tax: Option<Decimal>,
    #[validate(custom(function = "validate_date_input"))]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub status: Option<InvoiceStatus>,
}

/// Row to insert into `invoices`
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub id: StringUuid,
    pub invoice_number: String,
    pub client_id: StringUuid,
    pub issued_by_id: StringUuid,
    pub amount: Decimal,
    pub tax: Decimal,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
}

/// Fully resolved column values written by an update
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceChanges {
    pub amount: Decimal,
    pub tax: Decimal,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvoiceSortKey {
    #[default]
    CreatedAt,
    InvoiceNumber,
    DueDate,
    TotalAmount,
    Status,
}

#[derive(Debug, Clone)]
pub struct InvoiceFilter {
    pub owner_id: StringUuid,
    pub client_id: Option<StringUuid>,
    pub status: Option<InvoiceStatus>,
    pub search: Option<String>,
    pub sort_by: InvoiceSortKey,
    pub sort_order: SortOrder,
    pub page: PageRequest,
}

impl InvoiceFilter {
    pub fn new(owner_id: StringUuid) -> Self {
        Self {
            owner_id,
            client_id: None,
            status: None,
            search: None,
            sort_by: InvoiceSortKey::default(),
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

/// Numbering period for an invoice created at `now`: `YYYYMM`
pub fn invoice_period(now: DateTime<Utc>) -> String {
    format!("{:04}{:02}", now.year(), now.month())
}

/// `INV-YYYYMM-NNNN`; the sequence widens past four digits when needed.
pub fn format_invoice_number(period: &str, sequence: i64) -> String {
    format!("INV-{}-{:04}", period, sequence)
}

/// `amount + tax`, rejected when the sum no longer fits a money column
pub fn total_amount(amount: Decimal, tax: Decimal) -> Result<Decimal, AppError> {
    let total = amount + tax;
    if total > max_money() {
        return Err(AppError::invalid_field(
            "totalAmount",
            "range",
            "amount plus tax must not exceed 9999999999.99",
        ));
    }
    Ok(total)
}
