//! Compliance deadlines tracked per client

use super::common::{
    db_string_enum, deserialize_nullable, like_pattern, validate_date_input, PageRequest,
    SortOrder, StringUuid,
};
use super::client::ClientSummary;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

db_string_enum!(AlertPriority {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Urgent => "URGENT",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    #[default]
    Pending,
    Completed,
    Dismissed,
}

db_string_enum!(AlertStatus {
    Pending => "PENDING",
    Completed => "COMPLETED",
    Dismissed => "DISMISSED",
});

/// Compliance alert entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceAlert {
    pub id: StringUuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: AlertPriority,
    pub status: AlertStatus,
    pub client_id: StringUuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored alert together with its client, as read from the database
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub alert: ComplianceAlert,
    pub client: ClientSummary,
}

impl AlertRecord {
    pub fn into_view(self, now: DateTime<Utc>) -> AlertView {
        AlertView::new(self.alert, self.client, now)
    }
}

/// Alert with its client and the whole days left until the deadline
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: ComplianceAlert,
    pub client: ClientSummary,
    pub days_until_due: i64,
}

impl AlertView {
    pub fn new(alert: ComplianceAlert, client: ClientSummary, now: DateTime<Utc>) -> Self {
        let days_until_due = days_until_due(alert.due_date, now);
        Self {
            alert,
            client,
            days_until_due,
        }
    }
}

/// `ceil((due - now) / 1 day)`; overdue alerts yield zero or negative values.
pub fn days_until_due(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const MS_PER_DAY: i64 = 86_400_000;
    let millis = (due - now).num_milliseconds();
    millis.div_euclid(MS_PER_DAY) + i64::from(millis.rem_euclid(MS_PER_DAY) != 0)
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertInput {
    #[validate(length(min = 1, max = 255, message = "Title is required, at most 255 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_date_input"))]
    pub due_date: String,
    pub priority: Option<AlertPriority>,
    #[validate(length(min = 1, message = "clientId is required"))]
    pub client_id: String,
    /// Accepted for compatibility; new alerts always start as PENDING
    pub status: Option<AlertStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlertInput {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty, at most 255 characters"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(custom(function = "validate_date_input"))]
    pub due_date: Option<String>,
    pub priority: Option<AlertPriority>,
    pub status: Option<AlertStatus>,
}

/// Row to insert into `compliance_alerts`
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub id: StringUuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: AlertPriority,
    pub status: AlertStatus,
    pub client_id: StringUuid,
}

/// Fully resolved column values written by an update
#[derive(Debug, Clone, PartialEq)]
pub struct AlertChanges {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: AlertPriority,
    pub status: AlertStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertSortKey {
    #[default]
    DueDate,
    CreatedAt,
    Priority,
    Title,
    Status,
}

/// Deadline window for `upcoming=<days>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DueWindow {
    pub fn next_days(now: DateTime<Utc>, days: u32) -> Self {
        Self {
            from: now,
            to: now + Duration::days(i64::from(days)),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at <= self.to
    }
}

#[derive(Debug, Clone)]
pub struct AlertFilter {
    pub owner_id: StringUuid,
    pub client_id: Option<StringUuid>,
    pub status: Option<AlertStatus>,
    pub priority: Option<AlertPriority>,
    pub due_within: Option<DueWindow>,
    pub search: Option<String>,
    pub sort_by: AlertSortKey,
    pub sort_order: SortOrder,
    pub page: PageRequest,
}

impl AlertFilter {
    pub fn new(owner_id: StringUuid) -> Self {
        Self {
            owner_id,
            client_id: None,
            status: None,
            priority: None,
            due_within: None,
            search: None,
            sort_by: AlertSortKey::default(),
            sort_order: SortOrder::Asc,
            page: PageRequest::default(),
        }
    }

    /// Restrict to pending alerts due in the next `days` days
    pub fn upcoming(mut self, now: DateTime<Utc>, days: u32) -> Self {
        self.due_within = Some(DueWindow::next_days(now, days));
        self.status = Some(AlertStatus::Pending);
        self
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn search_pattern(&self) -> Option<String> {
        self.search_term().map(like_pattern)
    }
}
