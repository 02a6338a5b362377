//! OpenAPI 3.0 documentation assembly
//!
//! Aggregates handler path annotations and domain schemas into one document,
//! served as JSON outside production.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CADesk Core API",
        version = "0.3.0",
        description = "Back office for chartered accountants: clients, documents, invoices and compliance deadlines",
        license(name = "Proprietary"),
        contact(name = "CADesk Team")
    ),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Auth", description = "Registration and login"),
        (name = "Clients", description = "Clients owned by the calling CA"),
        (name = "Documents", description = "Client document uploads and metadata"),
        (name = "Invoices", description = "Invoices with monthly numbering"),
        (name = "Compliance", description = "Compliance deadlines and reminders"),
    ),
    security(
        ("bearer_jwt" = [])
    ),
    components(
        schemas(
            // ── Shared response types ──────────────────────────────────
            crate::api::Pagination,
            crate::api::MessageResponse,
            crate::api::health::HealthResponse,

            // ── Common ─────────────────────────────────────────────────
            crate::domain::StringUuid,
            crate::domain::UserSummary,

            // ── Users ──────────────────────────────────────────────────
            crate::domain::UserRole,
            crate::domain::User,
            crate::domain::CaProfile,
            crate::domain::ClientProfile,
            crate::domain::UserWithProfile,
            crate::domain::RegisteredUser,
            crate::domain::RegisterInput,
            crate::domain::CaProfileInput,
            crate::domain::ClientProfileInput,
            crate::domain::LoginInput,

            // ── Clients ────────────────────────────────────────────────
            crate::domain::Client,
            crate::domain::ClientView,
            crate::domain::ClientSummary,
            crate::domain::CreateClientInput,
            crate::domain::UpdateClientInput,

            // ── Documents ──────────────────────────────────────────────
            crate::domain::DocumentCategory,
            crate::domain::Document,
            crate::domain::DocumentClient,
            crate::domain::DocumentView,
            crate::domain::UpdateDocumentInput,

            // ── Invoices ───────────────────────────────────────────────
            crate::domain::InvoiceStatus,
            crate::domain::Invoice,
            crate::domain::InvoiceClient,
            crate::domain::IssuerFirm,
            crate::domain::InvoiceIssuer,
            crate::domain::InvoiceView,
            crate::domain::CreateInvoiceInput,
            crate::domain::UpdateInvoiceInput,

            // ── Compliance ─────────────────────────────────────────────
            crate::domain::AlertPriority,
            crate::domain::AlertStatus,
            crate::domain::ComplianceAlert,
            crate::domain::AlertView,
            crate::domain::CreateAlertInput,
            crate::domain::UpdateAlertInput,
        ),
    ),
    paths(
        crate::api::health::health,
        crate::api::health::ready,

        crate::api::auth::register,
        crate::api::auth::login,

        crate::api::client::create,
        crate::api::client::list,
        crate::api::client::get,
        crate::api::client::update,
        crate::api::client::deactivate,
        crate::api::client::restore,

        crate::api::document::upload,
        crate::api::document::list_for_client,
        crate::api::document::list,
        crate::api::document::get,
        crate::api::document::update,
        crate::api::document::delete,

        crate::api::invoice::create,
        crate::api::invoice::get,
        crate::api::invoice::list,
        crate::api::invoice::update,
        crate::api::invoice::delete,

        crate::api::compliance::create,
        crate::api::compliance::list,
        crate::api::compliance::get,
        crate::api::compliance::update,
        crate::api::compliance::delete,
    ),
)]
pub struct ApiDoc;

impl ApiDoc {
    /// The generated document plus the bearer JWT security scheme
    pub fn build() -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        if let Some(c) = doc.components.as_mut() {
            c.security_schemes.insert(
                "bearer_jwt".to_string(),
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
        doc
    }
}
