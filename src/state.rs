//! Application state trait for dependency injection
//!
//! Handlers are generic over `HasServices`, so the same router serves the
//! production `AppState` (MySQL repositories, local file storage) and the
//! in-memory state used by the HTTP tests.

use crate::config::Config;
use crate::jwt::JwtManager;
use crate::repository::{
    ClientRepository, ComplianceRepository, DocumentRepository, InvoiceRepository, UserRepository,
};
use crate::service::{
    AuthService, ClientService, ComplianceService, DocumentService, InvoiceService,
};
use crate::storage::FileStorage;

pub trait HasServices: Clone + Send + Sync + 'static {
    type UserRepo: UserRepository;
    type ClientRepo: ClientRepository;
    type DocumentRepo: DocumentRepository;
    type InvoiceRepo: InvoiceRepository;
    type AlertRepo: ComplianceRepository;
    type Storage: FileStorage;

    fn config(&self) -> &Config;

    /// Used by the auth middleware to verify bearer tokens
    fn jwt_manager(&self) -> &JwtManager;

    fn auth_service(&self) -> &AuthService<Self::UserRepo>;

    fn client_service(&self) -> &ClientService<Self::ClientRepo>;

    fn document_service(
        &self,
    ) -> &DocumentService<Self::DocumentRepo, Self::ClientRepo, Self::Storage>;

    fn invoice_service(&self) -> &InvoiceService<Self::InvoiceRepo, Self::ClientRepo>;

    fn compliance_service(&self) -> &ComplianceService<Self::AlertRepo, Self::ClientRepo>;

    /// Whether the backing store answers
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
