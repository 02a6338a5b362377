//! Compliance alert business logic

use super::ownership::require_active_owned_client;
use crate::domain::{
    parse_date_input, AlertChanges, AlertFilter, AlertStatus, AlertView, CreateAlertInput,
    NewAlert, StringUuid, UpdateAlertInput,
};
use crate::error::{AppError, Result};
use crate::repository::{ClientRepository, ComplianceRepository};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use validator::Validate;

pub struct ComplianceService<A: ComplianceRepository, C: ClientRepository> {
    repo: Arc<A>,
    clients: Arc<C>,
}

fn due_date(value: &str) -> Result<DateTime<Utc>> {
    parse_date_input(value).ok_or_else(|| AppError::invalid_field("dueDate", "date", "Invalid date"))
}

impl<A: ComplianceRepository, C: ClientRepository> ComplianceService<A, C> {
    pub fn new(repo: Arc<A>, clients: Arc<C>) -> Self {
        Self { repo, clients }
    }

    /// New alerts always start out PENDING, whatever status was sent.
    pub async fn create(&self, owner_id: StringUuid, input: CreateAlertInput) -> Result<AlertView> {
        input.validate()?;
        let client = require_active_owned_client(
            self.clients.as_ref(),
            owner_id,
            &input.client_id,
            "Client not found or you do not have permission to create alerts for this client",
        )
        .await?;

        let alert = NewAlert {
            id: StringUuid::new_v4(),
            title: input.title,
            description: input.description,
            due_date: due_date(&input.due_date)?,
            priority: input.priority.unwrap_or_default(),
            status: AlertStatus::Pending,
            client_id: client.client.id,
        };

        let record = self.repo.create(owner_id, &alert).await?;
        tracing::info!(alert_id = %alert.id, client_id = %alert.client_id, "Compliance alert created");
        Ok(record.into_view(Utc::now()))
    }

    pub async fn get(&self, owner_id: StringUuid, id: StringUuid) -> Result<AlertView> {
        self.repo
            .find_owned(owner_id, id)
            .await?
            .map(|record| record.into_view(Utc::now()))
            .ok_or_else(|| AppError::NotFound("Compliance alert not found".to_string()))
    }

    pub async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        input: UpdateAlertInput,
    ) -> Result<AlertView> {
        input.validate()?;
        let current = self
            .repo
            .find_owned(owner_id, id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "Compliance alert not found or you do not have permission to update it"
                        .to_string(),
                )
            })?
            .alert;

        let changes = AlertChanges {
            title: input.title.unwrap_or(current.title),
            description: match input.description {
                Some(value) => value,
                None => current.description,
            },
            due_date: match &input.due_date {
                Some(value) => due_date(value)?,
                None => current.due_date,
            },
            priority: input.priority.unwrap_or(current.priority),
            status: input.status.unwrap_or(current.status),
        };

        let record = self.repo.update(owner_id, id, &changes).await?;
        Ok(record.into_view(Utc::now()))
    }

    pub async fn delete(&self, owner_id: StringUuid, id: StringUuid) -> Result<()> {
        if self.repo.find_owned(owner_id, id).await?.is_none() {
            return Err(AppError::NotFound(
                "Compliance alert not found or you do not have permission to delete it"
                    .to_string(),
            ));
        }
        self.repo.delete(owner_id, id).await
    }

    /// `daysUntilDue` is computed against a single `now` for the whole page
    pub async fn list(&self, filter: &AlertFilter) -> Result<(Vec<AlertView>, i64)> {
        let now = Utc::now();
        let records = self.repo.list(filter).await?;
        let total = self.repo.count(filter).await?;
        let alerts = records.into_iter().map(|r| r.into_view(now)).collect();
        Ok((alerts, total))
    }
}
