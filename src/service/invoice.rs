//! Invoice business logic

use super::ownership::require_active_owned_client;
use crate::domain::{
    format_invoice_number, invoice_period, parse_date_input, total_amount, CreateInvoiceInput,
    InvoiceChanges, InvoiceFilter, InvoiceView, NewInvoice, StringUuid, UpdateInvoiceInput,
};
use crate::error::{AppError, Result};
use crate::repository::{ClientRepository, InvoiceRepository};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use std::sync::Arc;
use validator::Validate;

pub struct InvoiceService<I: InvoiceRepository, C: ClientRepository> {
    repo: Arc<I>,
    clients: Arc<C>,
}

fn due_date(value: &str) -> Result<DateTime<Utc>> {
    parse_date_input(value).ok_or_else(|| AppError::invalid_field("dueDate", "date", "Invalid date"))
}

impl<I: InvoiceRepository, C: ClientRepository> InvoiceService<I, C> {
    pub fn new(repo: Arc<I>, clients: Arc<C>) -> Self {
        Self { repo, clients }
    }

    pub async fn create(&self, owner_id: StringUuid, input: CreateInvoiceInput) -> Result<InvoiceView> {
        input.validate()?;
        let client = require_active_owned_client(
            self.clients.as_ref(),
            owner_id,
            &input.client_id,
            "Client not found or you do not have permission to create invoices for this client",
        )
        .await?;

        let due_date = due_date(&input.due_date)?;
        let tax = input.tax.unwrap_or(Decimal::ZERO);
        let total = total_amount(input.amount, tax)?;

        let period = invoice_period(Utc::now());
        let sequence = self.repo.next_sequence(&period).await?;

        let invoice = NewInvoice {
            id: StringUuid::new_v4(),
            invoice_number: format_invoice_number(&period, sequence),
            client_id: client.client.id,
            issued_by_id: owner_id,
            amount: input.amount,
            tax,
            total_amount: total,
            status: input.status.unwrap_or_default(),
            due_date,
            description: input.description,
        };

        let created = self.repo.create(&invoice).await?;
        tracing::info!(
            invoice_id = %created.invoice.id,
            invoice_number = %created.invoice.invoice_number,
            "Invoice created"
        );
        counter!("cadesk_invoices_created_total").increment(1);
        Ok(created)
    }

    pub async fn get(&self, owner_id: StringUuid, id: StringUuid) -> Result<InvoiceView> {
        self.repo
            .find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))
    }

    pub async fn list(&self, filter: &InvoiceFilter) -> Result<(Vec<InvoiceView>, i64)> {
        let invoices = self.repo.list(filter).await?;
        let total = self.repo.count(filter).await?;
        Ok((invoices, total))
    }

    /// Apply the fields present in `input`; the total follows amount and tax.
    pub async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        input: UpdateInvoiceInput,
    ) -> Result<InvoiceView> {
        input.validate()?;
        let existing = self.repo.find_owned(owner_id, id).await?.ok_or_else(|| {
            AppError::NotFound(
                "Invoice not found or you do not have permission to update it".to_string(),
            )
        })?;
        let current = existing.invoice;

        let amount = input.amount.unwrap_or(current.amount);
        let tax = input.tax.unwrap_or(current.tax);
        let changes = InvoiceChanges {
            amount,
            tax,
            total_amount: total_amount(amount, tax)?,
            status: input.status.unwrap_or(current.status),
            due_date: match &input.due_date {
                Some(value) => due_date(value)?,
                None => current.due_date,
            },
            description: match input.description {
                Some(value) => value,
                None => current.description,
            },
        };

        self.repo.update(owner_id, id, &changes).await
    }

    pub async fn delete(&self, owner_id: StringUuid, id: StringUuid) -> Result<()> {
        let existing = self.repo.find_owned(owner_id, id).await?.ok_or_else(|| {
            AppError::NotFound(
                "Invoice not found or you do not have permission to delete it".to_string(),
            )
        })?;

        if !existing.invoice.status.is_deletable() || !self.repo.delete_draft(owner_id, id).await? {
            return Err(AppError::BadRequest(
                "only draft invoices can be deleted".to_string(),
            ));
        }

        tracing::info!(invoice_id = %id, "Invoice deleted");
        Ok(())
    }
}
