//! API integration tests infrastructure
//!
//! In-memory repositories and file storage sharing one `TestStore`, so the
//! production handlers and services run without MySQL or a disk.

pub mod http;

use async_trait::async_trait;
use cadesk_core::config::JwtConfig;
use cadesk_core::domain::{
    AlertChanges, AlertFilter, AlertPriority, AlertRecord, AlertSortKey, CaProfile, Client,
    ClientFilter, ClientProfile, ClientSortKey, ClientSummary, ClientView, ComplianceAlert,
    CreateClientInput, Document, DocumentCategory, DocumentClient, DocumentFilter,
    DocumentSortKey, DocumentView, Invoice, InvoiceChanges, InvoiceClient, InvoiceFilter,
    InvoiceIssuer, InvoiceSortKey, InvoiceView, IssuerFirm, NewAlert, NewDocument, NewInvoice,
    NewProfile, NewUser, PageRequest, SortOrder, StringUuid, UpdateClientInput, User,
    UserRole, UserSummary,
};
use cadesk_core::error::{AppError, Result};
use cadesk_core::jwt::JwtManager;
use cadesk_core::repository::{
    ClientRepository, ComplianceRepository, DocumentRepository, InvoiceRepository,
    UserRepository,
};
use cadesk_core::storage::{generate_filename, FileStorage, StoredFile};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================================================
// Test Configuration
// ============================================================================

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-for-api-testing-purposes".to_string(),
        expires_in_secs: 3600,
    }
}

pub fn create_test_jwt_manager() -> JwtManager {
    JwtManager::new(test_jwt_config())
}

// ============================================================================
// Shared in-memory store
// ============================================================================

#[derive(Default)]
pub struct TestStore {
    pub users: Vec<User>,
    pub ca_profiles: Vec<CaProfile>,
    pub client_profiles: Vec<ClientProfile>,
    pub clients: Vec<Client>,
    pub documents: Vec<Document>,
    pub invoices: Vec<Invoice>,
    pub sequences: HashMap<String, i64>,
    pub alerts: Vec<ComplianceAlert>,
}

pub type SharedStore = Arc<RwLock<TestStore>>;

fn missing(what: &str) -> AppError {
    AppError::Internal(anyhow::anyhow!("test store is missing {}", what))
}

fn row_not_found() -> AppError {
    AppError::Database(sqlx::Error::RowNotFound)
}

fn matches_search(term: Option<&str>, fields: &[Option<&str>]) -> bool {
    let Some(term) = term else {
        return true;
    };
    let needle = term.to_lowercase();
    fields
        .iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn page_of<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect()
}

impl TestStore {
    fn user_summary(&self, id: StringUuid) -> Result<UserSummary> {
        let user = self
            .users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| missing("user"))?;
        Ok(UserSummary {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        })
    }

    fn client(&self, id: StringUuid) -> Result<&Client> {
        self.clients
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| missing("client"))
    }

    fn owns_client(&self, owner_id: StringUuid, client_id: StringUuid) -> bool {
        self.clients
            .iter()
            .any(|c| c.id == client_id && c.created_by_id == owner_id)
    }

    fn client_view(&self, client: &Client) -> Result<ClientView> {
        Ok(ClientView {
            client: client.clone(),
            created_by: self.user_summary(client.created_by_id)?,
        })
    }

    fn document_view(&self, document: &Document) -> Result<DocumentView> {
        let client = self.client(document.client_id)?;
        Ok(DocumentView {
            document: document.clone(),
            client: DocumentClient {
                id: client.id,
                name: client.name.clone(),
                email: client.email.clone(),
            },
            uploaded_by: self.user_summary(document.uploaded_by_id)?,
        })
    }

    fn invoice_view(&self, invoice: &Invoice) -> Result<InvoiceView> {
        let client = self.client(invoice.client_id)?;
        let issuer = self.user_summary(invoice.issued_by_id)?;
        let firm = self
            .ca_profiles
            .iter()
            .find(|p| p.user_id == invoice.issued_by_id)
            .map(|p| IssuerFirm {
                firm: p.firm.clone(),
                license_number: p.license_number.clone(),
            });
        Ok(InvoiceView {
            invoice: invoice.clone(),
            client: InvoiceClient {
                id: client.id,
                name: client.name.clone(),
                email: client.email.clone(),
                phone: client.phone.clone(),
                company_name: client.company_name.clone(),
                gstin: client.gstin.clone(),
                pan: client.pan.clone(),
                address: client.address.clone(),
            },
            issued_by: InvoiceIssuer {
                id: issuer.id,
                first_name: issuer.first_name,
                last_name: issuer.last_name,
                email: issuer.email,
                ca_profile: firm,
            },
        })
    }

    fn alert_record(&self, alert: &ComplianceAlert) -> Result<AlertRecord> {
        Ok(AlertRecord {
            alert: alert.clone(),
            client: ClientSummary::from(self.client(alert.client_id)?),
        })
    }

    fn filtered_clients(&self, filter: &ClientFilter) -> Vec<Client> {
        let mut clients: Vec<Client> = self
            .clients
            .iter()
            .filter(|c| c.created_by_id == filter.owner_id)
            .filter(|c| filter.include_inactive || c.is_active)
            .filter(|c| filter.id.map_or(true, |id| c.id == id))
            .filter(|c| {
                matches_search(
                    filter.search_term(),
                    &[
                        Some(c.name.as_str()),
                        Some(c.email.as_str()),
                        c.company_name.as_deref(),
                    ],
                )
            })
            .cloned()
            .collect();

        clients.sort_by(|a, b| {
            let ordering = match filter.sort_by {
                ClientSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                ClientSortKey::Name => a.name.cmp(&b.name),
                ClientSortKey::Email => a.email.cmp(&b.email),
                ClientSortKey::CompanyName => a.company_name.cmp(&b.company_name),
            };
            directed(ordering, filter.sort_order)
        });
        clients
    }

    fn filtered_documents(&self, filter: &DocumentFilter) -> Vec<Document> {
        let mut documents: Vec<Document> = self
            .documents
            .iter()
            .filter(|d| self.owns_client(filter.owner_id, d.client_id))
            .filter(|d| filter.client_id.map_or(true, |id| d.client_id == id))
            .filter(|d| filter.category.map_or(true, |c| d.category == c))
            .filter(|d| {
                let client_name = if filter.search_client_name {
                    self.client(d.client_id).ok().map(|c| c.name.as_str())
                } else {
                    None
                };
                matches_search(
                    filter.search_term(),
                    &[
                        Some(d.original_name.as_str()),
                        d.description.as_deref(),
                        client_name,
                    ],
                )
            })
            .cloned()
            .collect();

        documents.sort_by(|a, b| {
            let ordering = match filter.sort_by {
                DocumentSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                DocumentSortKey::OriginalName => a.original_name.cmp(&b.original_name),
                DocumentSortKey::Size => a.size.cmp(&b.size),
                DocumentSortKey::Category => a.category.as_str().cmp(b.category.as_str()),
            };
            directed(ordering, filter.sort_order)
        });
        documents
    }

    fn filtered_invoices(&self, filter: &InvoiceFilter) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|i| self.owns_client(filter.owner_id, i.client_id))
            .filter(|i| filter.client_id.map_or(true, |id| i.client_id == id))
            .filter(|i| filter.status.map_or(true, |s| i.status == s))
            .filter(|i| {
                let client_name = self.client(i.client_id).ok().map(|c| c.name.as_str());
                matches_search(
                    filter.search_term(),
                    &[
                        Some(i.invoice_number.as_str()),
                        i.description.as_deref(),
                        client_name,
                    ],
                )
            })
            .cloned()
            .collect();

        invoices.sort_by(|a, b| {
            let ordering = match filter.sort_by {
                InvoiceSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                InvoiceSortKey::InvoiceNumber => a.invoice_number.cmp(&b.invoice_number),
                InvoiceSortKey::DueDate => a.due_date.cmp(&b.due_date),
                InvoiceSortKey::TotalAmount => a.total_amount.cmp(&b.total_amount),
                InvoiceSortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            };
            directed(ordering, filter.sort_order)
        });
        invoices
    }

    fn filtered_alerts(&self, filter: &AlertFilter) -> Vec<ComplianceAlert> {
        let priority_rank = |p: AlertPriority| match p {
            AlertPriority::Low => 0,
            AlertPriority::Medium => 1,
            AlertPriority::High => 2,
            AlertPriority::Urgent => 3,
        };

        let mut alerts: Vec<ComplianceAlert> = self
            .alerts
            .iter()
            .filter(|a| self.owns_client(filter.owner_id, a.client_id))
            .filter(|a| filter.client_id.map_or(true, |id| a.client_id == id))
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .filter(|a| filter.priority.map_or(true, |p| a.priority == p))
            .filter(|a| filter.due_within.map_or(true, |w| w.contains(a.due_date)))
            .filter(|a| {
                let client_name = self.client(a.client_id).ok().map(|c| c.name.as_str());
                matches_search(
                    filter.search_term(),
                    &[Some(a.title.as_str()), a.description.as_deref(), client_name],
                )
            })
            .cloned()
            .collect();

        alerts.sort_by(|a, b| {
            let ordering = match filter.sort_by {
                AlertSortKey::DueDate => a.due_date.cmp(&b.due_date),
                AlertSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                AlertSortKey::Priority => priority_rank(a.priority).cmp(&priority_rank(b.priority)),
                AlertSortKey::Title => a.title.cmp(&b.title),
                AlertSortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            };
            directed(ordering, filter.sort_order)
        });
        alerts
    }
}

// ============================================================================
// Test Repository Implementations
// ============================================================================

pub struct TestUserRepository {
    store: SharedStore,
}

impl TestUserRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for TestUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let created = User {
            id: user.id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
        };
        store.users.push(created.clone());

        match &user.profile {
            Some(NewProfile::Ca(p)) => store.ca_profiles.push(CaProfile {
                id: StringUuid::new_v4(),
                user_id: user.id,
                license_number: p.license_number.clone(),
                firm: p.firm.clone(),
                experience: p.experience,
                specialization: p.specialization.clone(),
            }),
            Some(NewProfile::Client(p)) => store.client_profiles.push(ClientProfile {
                id: StringUuid::new_v4(),
                user_id: user.id,
                company_name: p.company_name.clone(),
                gstin: p.gstin.clone(),
                pan: p.pan.clone(),
                address: p.address.clone(),
            }),
            None => {}
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_ca_profile(&self, user_id: StringUuid) -> Result<Option<CaProfile>> {
        let store = self.store.read().await;
        Ok(store.ca_profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn find_client_profile(&self, user_id: StringUuid) -> Result<Option<ClientProfile>> {
        let store = self.store.read().await;
        Ok(store
            .client_profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }
}

pub struct TestClientRepository {
    store: SharedStore,
}

impl TestClientRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ClientRepository for TestClientRepository {
    async fn create(&self, owner_id: StringUuid, input: &CreateClientInput) -> Result<ClientView> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let client = Client {
            id: StringUuid::new_v4(),
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            company_name: input.company_name.clone(),
            gstin: input.gstin.clone(),
            pan: input.pan.clone(),
            address: input.address.clone(),
            is_active: input.is_active.unwrap_or(true),
            created_by_id: owner_id,
            created_at: now,
            updated_at: now,
        };
        store.clients.push(client.clone());
        store.client_view(&client)
    }

    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<ClientView>> {
        let store = self.store.read().await;
        match store
            .clients
            .iter()
            .find(|c| c.id == id && c.created_by_id == owner_id)
        {
            Some(client) => store.client_view(client).map(Some),
            None => Ok(None),
        }
    }

    async fn find_by_email(
        &self,
        owner_id: StringUuid,
        email: &str,
        exclude_id: Option<StringUuid>,
    ) -> Result<Option<Client>> {
        let store = self.store.read().await;
        Ok(store
            .clients
            .iter()
            .find(|c| {
                c.created_by_id == owner_id && c.email == email && Some(c.id) != exclude_id
            })
            .cloned())
    }

    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        input: &UpdateClientInput,
    ) -> Result<ClientView> {
        let mut store = self.store.write().await;
        let client = store
            .clients
            .iter_mut()
            .find(|c| c.id == id && c.created_by_id == owner_id)
            .ok_or_else(row_not_found)?;

        if let Some(name) = &input.name {
            client.name = name.clone();
        }
        if let Some(email) = &input.email {
            client.email = email.clone();
        }
        if let Some(value) = &input.phone {
            client.phone = value.clone();
        }
        if let Some(value) = &input.company_name {
            client.company_name = value.clone();
        }
        if let Some(value) = &input.gstin {
            client.gstin = value.clone();
        }
        if let Some(value) = &input.pan {
            client.pan = value.clone();
        }
        if let Some(value) = &input.address {
            client.address = value.clone();
        }
        client.updated_at = Utc::now();

        let updated = client.clone();
        store.client_view(&updated)
    }

    async fn set_active(&self, owner_id: StringUuid, id: StringUuid, active: bool) -> Result<ClientView> {
        let mut store = self.store.write().await;
        let client = store
            .clients
            .iter_mut()
            .find(|c| c.id == id && c.created_by_id == owner_id)
            .ok_or_else(row_not_found)?;
        client.is_active = active;
        client.updated_at = Utc::now();

        let updated = client.clone();
        store.client_view(&updated)
    }

    async fn list(&self, filter: &ClientFilter) -> Result<Vec<ClientView>> {
        let store = self.store.read().await;
        page_of(store.filtered_clients(filter), filter.page)
            .iter()
            .map(|c| store.client_view(c))
            .collect()
    }

    async fn count(&self, filter: &ClientFilter) -> Result<i64> {
        let store = self.store.read().await;
        Ok(store.filtered_clients(filter).len() as i64)
    }
}

pub struct TestDocumentRepository {
    store: SharedStore,
}

impl TestDocumentRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DocumentRepository for TestDocumentRepository {
    async fn create_many(&self, documents: &[NewDocument]) -> Result<Vec<DocumentView>> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let rows: Vec<Document> = documents
            .iter()
            .map(|d| Document {
                id: d.id,
                filename: d.filename.clone(),
                original_name: d.original_name.clone(),
                mimetype: d.mimetype.clone(),
                size: d.size,
                path: d.path.clone(),
                category: d.category,
                description: d.description.clone(),
                client_id: d.client_id,
                uploaded_by_id: d.uploaded_by_id,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let views = rows
            .iter()
            .map(|d| store.document_view(d))
            .collect::<Result<Vec<_>>>()?;
        store.documents.extend(rows);
        Ok(views)
    }

    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<DocumentView>> {
        let store = self.store.read().await;
        match store
            .documents
            .iter()
            .find(|d| d.id == id && store.owns_client(owner_id, d.client_id))
        {
            Some(document) => store.document_view(document).map(Some),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        category: DocumentCategory,
        description: Option<String>,
    ) -> Result<DocumentView> {
        let mut store = self.store.write().await;
        let owned: Vec<StringUuid> = store
            .clients
            .iter()
            .filter(|c| c.created_by_id == owner_id)
            .map(|c| c.id)
            .collect();
        let document = store
            .documents
            .iter_mut()
            .find(|d| d.id == id && owned.contains(&d.client_id))
            .ok_or_else(row_not_found)?;
        document.category = category;
        document.description = description;
        document.updated_at = Utc::now();

        let updated = document.clone();
        store.document_view(&updated)
    }

    async fn delete(&self, owner_id: StringUuid, id: StringUuid) -> Result<()> {
        let mut store = self.store.write().await;
        let before = store.documents.len();
        let owned: Vec<StringUuid> = store
            .clients
            .iter()
            .filter(|c| c.created_by_id == owner_id)
            .map(|c| c.id)
            .collect();
        store
            .documents
            .retain(|d| !(d.id == id && owned.contains(&d.client_id)));
        if store.documents.len() == before {
            return Err(row_not_found());
        }
        Ok(())
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentView>> {
        let store = self.store.read().await;
        page_of(store.filtered_documents(filter), filter.page)
            .iter()
            .map(|d| store.document_view(d))
            .collect()
    }

    async fn count(&self, filter: &DocumentFilter) -> Result<i64> {
        let store = self.store.read().await;
        Ok(store.filtered_documents(filter).len() as i64)
    }
}

pub struct TestInvoiceRepository {
    store: SharedStore,
}

impl TestInvoiceRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InvoiceRepository for TestInvoiceRepository {
    async fn next_sequence(&self, period: &str) -> Result<i64> {
        let mut store = self.store.write().await;
        let value = store.sequences.entry(period.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn create(&self, invoice: &NewInvoice) -> Result<InvoiceView> {
        let mut store = self.store.write().await;
        if store
            .invoices
            .iter()
            .any(|i| i.invoice_number == invoice.invoice_number)
        {
            return Err(AppError::Conflict("Duplicate invoice number".to_string()));
        }
        let now = Utc::now();
        let row = Invoice {
            id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            client_id: invoice.client_id,
            issued_by_id: invoice.issued_by_id,
            amount: invoice.amount,
            tax: invoice.tax,
            total_amount: invoice.total_amount,
            status: invoice.status,
            due_date: invoice.due_date,
            description: invoice.description.clone(),
            created_at: now,
            updated_at: now,
        };
        let view = store.invoice_view(&row)?;
        store.invoices.push(row);
        Ok(view)
    }

    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<InvoiceView>> {
        let store = self.store.read().await;
        match store
            .invoices
            .iter()
            .find(|i| i.id == id && store.owns_client(owner_id, i.client_id))
        {
            Some(invoice) => store.invoice_view(invoice).map(Some),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        changes: &InvoiceChanges,
    ) -> Result<InvoiceView> {
        let mut store = self.store.write().await;
        let owned: Vec<StringUuid> = store
            .clients
            .iter()
            .filter(|c| c.created_by_id == owner_id)
            .map(|c| c.id)
            .collect();
        let invoice = store
            .invoices
            .iter_mut()
            .find(|i| i.id == id && owned.contains(&i.client_id))
            .ok_or_else(row_not_found)?;
        invoice.amount = changes.amount;
        invoice.tax = changes.tax;
        invoice.total_amount = changes.total_amount;
        invoice.status = changes.status;
        invoice.due_date = changes.due_date;
        invoice.description = changes.description.clone();
        invoice.updated_at = Utc::now();

        let updated = invoice.clone();
        store.invoice_view(&updated)
    }

    async fn delete_draft(&self, owner_id: StringUuid, id: StringUuid) -> Result<bool> {
        let mut store = self.store.write().await;
        let owned: Vec<StringUuid> = store
            .clients
            .iter()
            .filter(|c| c.created_by_id == owner_id)
            .map(|c| c.id)
            .collect();
        let before = store.invoices.len();
        store.invoices.retain(|i| {
            !(i.id == id && owned.contains(&i.client_id) && i.status.is_deletable())
        });
        Ok(store.invoices.len() < before)
    }

    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<InvoiceView>> {
        let store = self.store.read().await;
        page_of(store.filtered_invoices(filter), filter.page)
            .iter()
            .map(|i| store.invoice_view(i))
            .collect()
    }

    async fn count(&self, filter: &InvoiceFilter) -> Result<i64> {
        let store = self.store.read().await;
        Ok(store.filtered_invoices(filter).len() as i64)
    }
}

pub struct TestComplianceRepository {
    store: SharedStore,
}

impl TestComplianceRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ComplianceRepository for TestComplianceRepository {
    async fn create(&self, owner_id: StringUuid, alert: &NewAlert) -> Result<AlertRecord> {
        let mut store = self.store.write().await;
        if !store.owns_client(owner_id, alert.client_id) {
            return Err(row_not_found());
        }
        let now = Utc::now();
        let row = ComplianceAlert {
            id: alert.id,
            title: alert.title.clone(),
            description: alert.description.clone(),
            due_date: alert.due_date,
            priority: alert.priority,
            status: alert.status,
            client_id: alert.client_id,
            created_at: now,
            updated_at: now,
        };
        let record = store.alert_record(&row)?;
        store.alerts.push(row);
        Ok(record)
    }

    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<AlertRecord>> {
        let store = self.store.read().await;
        match store
            .alerts
            .iter()
            .find(|a| a.id == id && store.owns_client(owner_id, a.client_id))
        {
            Some(alert) => store.alert_record(alert).map(Some),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        changes: &AlertChanges,
    ) -> Result<AlertRecord> {
        let mut store = self.store.write().await;
        let owned: Vec<StringUuid> = store
            .clients
            .iter()
            .filter(|c| c.created_by_id == owner_id)
            .map(|c| c.id)
            .collect();
        let alert = store
            .alerts
            .iter_mut()
            .find(|a| a.id == id && owned.contains(&a.client_id))
            .ok_or_else(row_not_found)?;
        alert.title = changes.title.clone();
        alert.description = changes.description.clone();
        alert.due_date = changes.due_date;
        alert.priority = changes.priority;
        alert.status = changes.status;
        alert.updated_at = Utc::now();

        let updated = alert.clone();
        store.alert_record(&updated)
    }

    async fn delete(&self, owner_id: StringUuid, id: StringUuid) -> Result<()> {
        let mut store = self.store.write().await;
        let owned: Vec<StringUuid> = store
            .clients
            .iter()
            .filter(|c| c.created_by_id == owner_id)
            .map(|c| c.id)
            .collect();
        let before = store.alerts.len();
        store
            .alerts
            .retain(|a| !(a.id == id && owned.contains(&a.client_id)));
        if store.alerts.len() == before {
            return Err(row_not_found());
        }
        Ok(())
    }

    async fn list(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>> {
        let store = self.store.read().await;
        page_of(store.filtered_alerts(filter), filter.page)
            .iter()
            .map(|a| store.alert_record(a))
            .collect()
    }

    async fn count(&self, filter: &AlertFilter) -> Result<i64> {
        let store = self.store.read().await;
        Ok(store.filtered_alerts(filter).len() as i64)
    }
}

// ============================================================================
// In-memory file storage
// ============================================================================

/// Keeps stored files in a map keyed by path. `fail_writes` makes every
/// `store` call fail, for rollback tests.
#[derive(Default)]
pub struct TestFileStorage {
    pub files: RwLock<HashMap<String, Vec<u8>>>,
    pub fail_writes: AtomicBool,
}

impl TestFileStorage {
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    pub async fn file_count(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl FileStorage for TestFileStorage {
    async fn store(&self, original_name: &str, data: &[u8]) -> io::Result<StoredFile> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        let filename = generate_filename(original_name);
        let path = format!("memory://uploads/{}", filename);
        self.files.write().await.insert(path.clone(), data.to_vec());
        Ok(StoredFile { filename, path })
    }

    async fn remove(&self, path: &str) -> io::Result<()> {
        self.files.write().await.remove(path);
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Insert an active user with a CA profile straight into the store
pub async fn seed_ca(store: &SharedStore, email: &str) -> User {
    let now = Utc::now();
    let user = User {
        id: StringUuid::new_v4(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        first_name: "Asha".to_string(),
        last_name: "Rao".to_string(),
        phone: None,
        role: UserRole::Ca,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let mut guard = store.write().await;
    guard.users.push(user.clone());
    guard.ca_profiles.push(CaProfile {
        id: StringUuid::new_v4(),
        user_id: user.id,
        license_number: "CA-12345".to_string(),
        firm: "Rao & Associates".to_string(),
        experience: 8,
        specialization: Some("GST".to_string()),
    });
    user
}

/// Insert a client owned by `owner_id` straight into the store
pub async fn seed_client(store: &SharedStore, owner_id: StringUuid, name: &str, active: bool) -> Client {
    let now = Utc::now();
    let client = Client {
        id: StringUuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: Some("9876543210".to_string()),
        company_name: Some(format!("{} Pvt Ltd", name)),
        gstin: None,
        pan: None,
        address: None,
        is_active: active,
        created_by_id: owner_id,
        created_at: now,
        updated_at: now,
    };
    store.write().await.clients.push(client.clone());
    client
}
