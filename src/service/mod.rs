//! Business logic layer

pub mod auth;
pub mod client;
pub mod compliance;
pub mod document;
pub mod invoice;
pub mod ownership;

pub use auth::AuthService;
pub use client::ClientService;
pub use compliance::ComplianceService;
pub use document::DocumentService;
pub use invoice::InvoiceService;
