//! Configuration management for CADesk Core

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Deployment environment ("development", "production", ...)
    pub environment: String,
    /// Single origin allowed by CORS
    pub frontend_url: String,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Password hashing configuration
    pub password: PasswordConfig,
    /// Document upload configuration
    pub upload: UploadConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in seconds
    pub expires_in_secs: i64,
}

#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { bcrypt_cost: 12 }
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory where uploaded documents are written
    pub dir: PathBuf,
    /// Per-file size limit in bytes
    pub max_file_size: usize,
    /// Maximum number of files in one upload request
    pub max_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            max_file_size: 10 * 1024 * 1024,
            max_files: 10,
        }
    }
}

impl UploadConfig {
    /// Request body limit for the upload route: every file at full size plus
    /// headroom for the text fields and multipart framing.
    pub fn body_limit(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_files)
            .saturating_add(1024 * 1024)
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "json" for structured output, anything else for human-readable
    pub log_format: String,
    pub metrics_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            service_name: "cadesk-core".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bcrypt_cost: u32 = env::var("BCRYPT_SALT_ROUNDS")
            .unwrap_or_else(|_| "12".to_string())
            .parse()
            .context("Invalid BCRYPT_SALT_ROUNDS")?;
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_SALT_ROUNDS must be between 4 and 31, got {}", bcrypt_cost);
        }

        let expires_in = env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| "7d".to_string());

        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                expires_in_secs: parse_duration_secs(&expires_in)
                    .with_context(|| format!("Invalid JWT_EXPIRES_IN: {}", expires_in))?,
            },
            password: PasswordConfig { bcrypt_cost },
            upload: UploadConfig {
                dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("uploads")),
                max_file_size: env::var("UPLOAD_MAX_FILE_SIZE")
                    .unwrap_or_else(|_| "10485760".to_string())
                    .parse()
                    .context("Invalid UPLOAD_MAX_FILE_SIZE")?,
                max_files: 10,
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|s| s.to_lowercase() == "true")
                    .unwrap_or(false),
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "cadesk-core".to_string()),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or a bare number
/// of seconds.
pub fn parse_duration_secs(value: &str) -> Result<i64> {
    let value = value.trim();
    if value.is_empty() {
        bail!("duration is empty");
    }

    let (digits, multiplier) = match value.char_indices().last() {
        Some((idx, 'd')) => (&value[..idx], 86_400),
        Some((idx, 'h')) => (&value[..idx], 3_600),
        Some((idx, 'm')) => (&value[..idx], 60),
        Some((idx, 's')) => (&value[..idx], 1),
        _ => (value, 1),
    };

    let amount: i64 = digits
        .trim()
        .parse()
        .with_context(|| format!("not a number: {:?}", digits))?;
    if amount <= 0 {
        bail!("duration must be positive");
    }

    amount
        .checked_mul(multiplier)
        .context("duration is too large")
}
