//! CADesk Core - back office for chartered accountants
//!
//! HTTP JSON API over MySQL for a CA's clients, their documents, invoices
//! and compliance deadlines. Every resource is scoped to the CA that owns it.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod openapi;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
