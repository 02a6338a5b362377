//! Storage for uploaded document files
//!
//! Files are written under a single upload directory with a generated name
//! `{unix_millis}-{uuid}{.ext}`; the caller's original file name is kept
//! only in the database.

use crate::domain::file_extension;
use async_trait::async_trait;
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where a file ended up after `store`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated file name
    pub filename: String,
    /// Full storage path, used for later removal
    pub path: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(&self, original_name: &str, data: &[u8]) -> io::Result<StoredFile>;
    async fn remove(&self, path: &str) -> io::Result<()>;
}

/// Local filesystem storage rooted at the configured upload directory
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_root(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }
}

/// `{unix_millis}-{uuid}{.ext}`
pub fn generate_filename(original_name: &str) -> String {
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        file_extension(original_name).unwrap_or_default()
    )
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, original_name: &str, data: &[u8]) -> io::Result<StoredFile> {
        self.ensure_root().await?;

        let filename = generate_filename(original_name);
        let path = self.root.join(&filename);
        tokio::fs::write(&path, data).await?;

        tracing::debug!(filename = %filename, size = data.len(), "Stored uploaded file");

        Ok(StoredFile {
            filename,
            path: path.to_string_lossy().into_owned(),
        })
    }

    async fn remove(&self, path: &str) -> io::Result<()> {
        let path = Path::new(path);
        // Never touch anything outside the upload directory
        if !path.starts_with(&self.root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is outside the upload directory", path.display()),
            ));
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
