//! Client business logic

use crate::domain::{ClientFilter, ClientView, CreateClientInput, StringUuid, UpdateClientInput};
use crate::error::{AppError, Result};
use crate::repository::ClientRepository;
use std::sync::Arc;
use validator::Validate;

const DUPLICATE_EMAIL: &str = "Client with this email already exists";

pub struct ClientService<R: ClientRepository> {
    repo: Arc<R>,
}

impl<R: ClientRepository> ClientService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, owner_id: StringUuid, input: CreateClientInput) -> Result<ClientView> {
        input.validate()?;

        if self
            .repo
            .find_by_email(owner_id, &input.email, None)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(DUPLICATE_EMAIL.to_string()));
        }

        let client = self.repo.create(owner_id, &input).await?;
        tracing::info!(client_id = %client.client.id, owner_id = %owner_id, "Client created");
        Ok(client)
    }

    pub async fn get(&self, owner_id: StringUuid, id: StringUuid) -> Result<ClientView> {
        self.repo
            .find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".to_string()))
    }

    pub async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        input: UpdateClientInput,
    ) -> Result<ClientView> {
        input.validate()?;
        let existing = self.get(owner_id, id).await?;

        if let Some(email) = &input.email {
            if *email != existing.client.email
                && self
                    .repo
                    .find_by_email(owner_id, email, Some(id))
                    .await?
                    .is_some()
            {
                return Err(AppError::BadRequest(DUPLICATE_EMAIL.to_string()));
            }
        }

        self.repo.update(owner_id, id, &input).await
    }

    /// Soft delete: the client disappears from default listings but its
    /// documents, invoices and alerts stay in place.
    pub async fn deactivate(&self, owner_id: StringUuid, id: StringUuid) -> Result<()> {
        match self.repo.find_owned(owner_id, id).await? {
            Some(view) if view.client.is_active => {}
            _ => return Err(AppError::NotFound("Client not found".to_string())),
        }

        self.repo.set_active(owner_id, id, false).await?;
        tracing::info!(client_id = %id, owner_id = %owner_id, "Client deactivated");
        Ok(())
    }

    pub async fn restore(&self, owner_id: StringUuid, id: StringUuid) -> Result<ClientView> {
        match self.repo.find_owned(owner_id, id).await? {
            Some(view) if !view.client.is_active => {}
            _ => return Err(AppError::NotFound("Deactivated client not found".to_string())),
        }

        let client = self.repo.set_active(owner_id, id, true).await?;
        tracing::info!(client_id = %id, owner_id = %owner_id, "Client restored");
        Ok(client)
    }

    pub async fn list(&self, filter: &ClientFilter) -> Result<(Vec<ClientView>, i64)> {
        let clients = self.repo.list(filter).await?;
        let total = self.repo.count(filter).await?;
        Ok((clients, total))
    }
}
