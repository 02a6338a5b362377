//! HTTP middleware for CADesk Core
//!
//! - bearer-token authentication and the `AuthUser` extractor
//! - validated JSON bodies
//! - error envelope normalization, tracing spans and request metrics

pub mod auth;
pub mod error_response;
pub mod metrics;
pub mod require_auth;
pub mod trace;
pub mod validation;

pub use auth::{AuthError, AuthUser};
pub use error_response::normalize_error_response;
pub use metrics::ObservabilityLayer;
pub use require_auth::{require_auth_middleware, AuthMiddlewareState};
pub use trace::SanitizedMakeSpan;
pub use validation::ValidatedJson;
