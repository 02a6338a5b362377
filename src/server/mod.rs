//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::middleware::{
    normalize_error_response, require_auth_middleware, AuthMiddlewareState, ObservabilityLayer,
    SanitizedMakeSpan,
};
use crate::openapi::ApiDoc;
use crate::repository::{
    ClientRepositoryImpl, ComplianceRepositoryImpl, DocumentRepositoryImpl,
    InvoiceRepositoryImpl, UserRepositoryImpl,
};
use crate::service::{
    AuthService, ClientService, ComplianceService, DocumentService, InvoiceService,
};
use crate::state::HasServices;
use crate::storage::LocalFileStorage;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

type ClientRepo = ClientRepositoryImpl;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub jwt_manager: JwtManager,
    pub auth_service: Arc<AuthService<UserRepositoryImpl>>,
    pub client_service: Arc<ClientService<ClientRepo>>,
    pub document_service:
        Arc<DocumentService<DocumentRepositoryImpl, ClientRepo, LocalFileStorage>>,
    pub invoice_service: Arc<InvoiceService<InvoiceRepositoryImpl, ClientRepo>>,
    pub compliance_service: Arc<ComplianceService<ComplianceRepositoryImpl, ClientRepo>>,
}

impl HasServices for AppState {
    type UserRepo = UserRepositoryImpl;
    type ClientRepo = ClientRepo;
    type DocumentRepo = DocumentRepositoryImpl;
    type InvoiceRepo = InvoiceRepositoryImpl;
    type AlertRepo = ComplianceRepositoryImpl;
    type Storage = LocalFileStorage;

    fn config(&self) -> &Config {
        &self.config
    }

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    fn auth_service(&self) -> &AuthService<Self::UserRepo> {
        &self.auth_service
    }

    fn client_service(&self) -> &ClientService<Self::ClientRepo> {
        &self.client_service
    }

    fn document_service(
        &self,
    ) -> &DocumentService<Self::DocumentRepo, Self::ClientRepo, Self::Storage> {
        &self.document_service
    }

    fn invoice_service(&self) -> &InvoiceService<Self::InvoiceRepo, Self::ClientRepo> {
        &self.invoice_service
    }

    fn compliance_service(&self) -> &ComplianceService<Self::AlertRepo, Self::ClientRepo> {
        &self.compliance_service
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok()
    }
}

impl AppState {
    /// Wire repositories and services around one connection pool
    pub fn new(config: Config, db_pool: MySqlPool, storage: LocalFileStorage) -> Self {
        let users = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
        let clients = Arc::new(ClientRepositoryImpl::new(db_pool.clone()));
        let documents = Arc::new(DocumentRepositoryImpl::new(db_pool.clone()));
        let invoices = Arc::new(InvoiceRepositoryImpl::new(db_pool.clone()));
        let alerts = Arc::new(ComplianceRepositoryImpl::new(db_pool.clone()));

        let jwt_manager = JwtManager::new(config.jwt.clone());

        Self {
            auth_service: Arc::new(AuthService::new(
                users,
                jwt_manager.clone(),
                config.password.clone(),
            )),
            client_service: Arc::new(ClientService::new(clients.clone())),
            document_service: Arc::new(DocumentService::new(
                documents,
                clients.clone(),
                Arc::new(storage),
                config.upload.clone(),
            )),
            invoice_service: Arc::new(InvoiceService::new(invoices, clients.clone())),
            compliance_service: Arc::new(ComplianceService::new(alerts, clients)),
            jwt_manager,
            config: Arc::new(config),
            db_pool,
        }
    }
}

pub async fn run(config: Config, prometheus: Option<PrometheusHandle>) -> Result<()> {
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let storage = LocalFileStorage::new(config.upload.dir.clone());
    storage
        .ensure_root()
        .await
        .with_context(|| format!("Failed to create upload directory {:?}", storage.root()))?;
    info!(dir = ?storage.root(), "Upload storage ready");

    let http_addr = config.http_addr();
    let state = AppState::new(config, db_pool, storage);
    let app = build_router(state, prometheus);

    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", http_addr))?;
    info!("HTTP server started on {}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found",
        })),
    )
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
        ]);

    match HeaderValue::from_str(&config.frontend_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(frontend_url = %config.frontend_url, "FRONTEND_URL is not a valid origin; CORS disabled");
            layer
        }
    }
}

/// Build the HTTP router with generic state type
///
/// Production passes `AppState`; tests pass an in-memory implementation of
/// `HasServices`.
pub fn build_router<S: HasServices>(state: S, prometheus: Option<PrometheusHandle>) -> Router {
    let config = state.config().clone();
    let auth_state = AuthMiddlewareState::new(state.jwt_manager().clone());

    let protected = Router::new()
        // Clients
        .route("/api/clients/createClient", post(api::client::create::<S>))
        .route("/api/clients/getClients", get(api::client::list::<S>))
        .route("/api/clients/getClient/{id}", get(api::client::get::<S>))
        .route("/api/clients/updateClient/{id}", put(api::client::update::<S>))
        .route(
            "/api/clients/delete/{id}",
            axum::routing::delete(api::client::deactivate::<S>),
        )
        .route("/api/clients/restore/{id}", post(api::client::restore::<S>))
        // Documents
        .route("/api/documents/upload", post(api::document::upload::<S>))
        .route(
            "/api/documents/getDocument/{clientId}",
            get(api::document::list_for_client::<S>),
        )
        .route("/api/documents/getAllDocuments", get(api::document::list::<S>))
        .route(
            "/api/documents/getDocumentById/{id}",
            get(api::document::get::<S>),
        )
        .route(
            "/api/documents/updateDocument/{id}",
            patch(api::document::update::<S>),
        )
        .route(
            "/api/documents/deleteDocument/{id}",
            axum::routing::delete(api::document::delete::<S>),
        )
        // Invoices
        .route("/api/invoices/createInvoice", post(api::invoice::create::<S>))
        .route("/api/invoices/getInvoice/{id}", get(api::invoice::get::<S>))
        .route("/api/invoices/getAllInvoices", get(api::invoice::list::<S>))
        .route(
            "/api/invoices/updateInvoice/{id}",
            patch(api::invoice::update::<S>),
        )
        .route(
            "/api/invoices/deleteInvoice/{id}",
            axum::routing::delete(api::invoice::delete::<S>),
        )
        // Compliance alerts
        .route("/api/compliance/create", post(api::compliance::create::<S>))
        .route("/api/compliance/getAlerts", get(api::compliance::list::<S>))
        .route("/api/compliance/getAlert/{id}", get(api::compliance::get::<S>))
        .route(
            "/api/compliance/update/{id}",
            patch(api::compliance::update::<S>),
        )
        .route(
            "/api/compliance/delete/{id}",
            patch(api::compliance::delete::<S>).delete(api::compliance::delete::<S>),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            require_auth_middleware,
        ));

    let mut public = Router::new()
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        .route("/api/auth/register", post(api::auth::register::<S>))
        .route("/api/auth/login", post(api::auth::login::<S>));

    if !config.is_production() {
        public = public.route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::build()) }),
        );
    }

    let metrics = Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(prometheus));

    public
        .merge(protected)
        .with_state(state)
        .merge(metrics)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(config.upload.body_limit()))
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http().make_span_with(SanitizedMakeSpan))
        .layer(ObservabilityLayer)
}
