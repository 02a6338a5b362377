//! Document upload and management

use super::ownership::require_active_owned_client;
use crate::config::UploadConfig;
use crate::domain::{
    DocumentClient, DocumentFilter, DocumentUploadInput, DocumentView, NewDocument, StringUuid,
    UpdateDocumentInput, UploadedFile,
};
use crate::error::{AppError, Result};
use crate::repository::{ClientRepository, DocumentRepository};
use crate::storage::FileStorage;
use metrics::counter;
use std::sync::Arc;
use validator::Validate;

pub struct DocumentService<D: DocumentRepository, C: ClientRepository, S: FileStorage> {
    repo: Arc<D>,
    clients: Arc<C>,
    storage: Arc<S>,
    limits: UploadConfig,
}

impl<D: DocumentRepository, C: ClientRepository, S: FileStorage> DocumentService<D, C, S> {
    pub fn new(repo: Arc<D>, clients: Arc<C>, storage: Arc<S>, limits: UploadConfig) -> Self {
        Self {
            repo,
            clients,
            storage,
            limits,
        }
    }

    /// Store every file and record it against the client. Either all files
    /// end up stored and recorded, or none do.
    pub async fn upload(
        &self,
        owner_id: StringUuid,
        input: DocumentUploadInput,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<DocumentView>> {
        input.validate()?;
        let client = require_active_owned_client(
            self.clients.as_ref(),
            owner_id,
            &input.client_id,
            "Client not found or you do not have permission to upload documents for this client",
        )
        .await?;

        if files.is_empty() {
            return Err(AppError::BadRequest("No files uploaded".to_string()));
        }
        if files.len() > self.limits.max_files {
            return Err(AppError::BadRequest(format!(
                "Too many files. At most {} files can be uploaded at once",
                self.limits.max_files
            )));
        }
        if let Some(file) = files.iter().find(|f| f.data.len() > self.limits.max_file_size) {
            return Err(AppError::BadRequest(format!(
                "File '{}' exceeds the maximum size of {} bytes",
                file.original_name, self.limits.max_file_size
            )));
        }
        for file in &files {
            file.check_metadata()?;
        }

        let category = input.category.unwrap_or_default();
        let description = input.description.filter(|d| !d.trim().is_empty());

        let mut written: Vec<String> = Vec::with_capacity(files.len());
        let mut rows = Vec::with_capacity(files.len());
        for file in &files {
            let stored = match self.storage.store(&file.original_name, &file.data).await {
                Ok(stored) => stored,
                Err(e) => {
                    self.discard(&written).await;
                    return Err(e.into());
                }
            };
            written.push(stored.path.clone());
            rows.push(NewDocument {
                id: StringUuid::new_v4(),
                filename: stored.filename,
                original_name: file.original_name.clone(),
                mimetype: file.mimetype.clone(),
                size: file.data.len() as i64,
                path: stored.path,
                category,
                description: description.clone(),
                client_id: client.client.id,
                uploaded_by_id: owner_id,
            });
        }

        match self.repo.create_many(&rows).await {
            Ok(documents) => {
                tracing::info!(
                    client_id = %client.client.id,
                    count = documents.len(),
                    "Documents uploaded"
                );
                counter!("cadesk_documents_uploaded_total").increment(documents.len() as u64);
                Ok(documents)
            }
            Err(e) => {
                self.discard(&written).await;
                Err(e)
            }
        }
    }

    /// Best-effort removal of files written by a failed upload
    async fn discard(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.storage.remove(path).await {
                tracing::warn!(path = %path, error = %e, "Failed to remove orphaned upload");
            }
        }
    }

    pub async fn get(&self, owner_id: StringUuid, id: StringUuid) -> Result<DocumentView> {
        self.repo
            .find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))
    }

    /// Documents of one client, together with the client they belong to.
    /// The client may be deactivated; its documents stay readable.
    pub async fn list_for_client(
        &self,
        client_id: StringUuid,
        filter: DocumentFilter,
    ) -> Result<(DocumentClient, Vec<DocumentView>, i64)> {
        let client = self
            .clients
            .find_owned(filter.owner_id, client_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "Client not found or you do not have permission to view this client"
                        .to_string(),
                )
            })?
            .client;

        let filter = DocumentFilter {
            client_id: Some(client.id),
            search_client_name: false,
            ..filter
        };
        let (documents, total) = self.list(&filter).await?;

        let summary = DocumentClient {
            id: client.id,
            name: client.name,
            email: client.email,
        };
        Ok((summary, documents, total))
    }

    pub async fn list(&self, filter: &DocumentFilter) -> Result<(Vec<DocumentView>, i64)> {
        let documents = self.repo.list(filter).await?;
        let total = self.repo.count(filter).await?;
        Ok((documents, total))
    }

    pub async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        input: UpdateDocumentInput,
    ) -> Result<DocumentView> {
        input.validate()?;
        let existing = self.repo.find_owned(owner_id, id).await?.ok_or_else(|| {
            AppError::NotFound(
                "Document not found or you do not have permission to update it".to_string(),
            )
        })?;

        let category = input.category.unwrap_or(existing.document.category);
        let description = match input.description {
            Some(value) => value,
            None => existing.document.description,
        };

        self.repo.update(owner_id, id, category, description).await
    }

    /// Remove the row, then the stored file. A file that cannot be removed
    /// is logged and left behind.
    pub async fn delete(&self, owner_id: StringUuid, id: StringUuid) -> Result<()> {
        let existing = self.repo.find_owned(owner_id, id).await?.ok_or_else(|| {
            AppError::NotFound(
                "Document not found or you do not have permission to delete it".to_string(),
            )
        })?;

        self.repo.delete(owner_id, id).await?;

        if let Err(e) = self.storage.remove(&existing.document.path).await {
            tracing::warn!(
                document_id = %id,
                path = %existing.document.path,
                error = %e,
                "Failed to remove stored file"
            );
        }
        Ok(())
    }
}
