//! Data access layer (Repository pattern)

pub mod client;
pub mod compliance;
pub mod document;
pub mod invoice;
mod scope;
pub mod user;

pub use client::{ClientRepository, ClientRepositoryImpl};
pub use compliance::{ComplianceRepository, ComplianceRepositoryImpl};
pub use document::{DocumentRepository, DocumentRepositoryImpl};
pub use invoice::{InvoiceRepository, InvoiceRepositoryImpl};
pub use user::{UserRepository, UserRepositoryImpl};
