//! Local filesystem object store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use convertly_core::error::{AppError, ErrorKind};
use convertly_core::result::AppResult;
use convertly_core::traits::ObjectStore;

/// Object store rooted at a local directory.
///
/// Signed URLs are single-node download links carrying an expiry and an
/// opaque token; an S3-style provider would replace this behind the
/// same trait.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    /// Root directory for all stored objects.
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a new local object store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve an object key to an absolute path within the root.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let clean = key.trim_start_matches('/');
        if clean.split('/').any(|part| part == "..") {
            return Err(AppError::validation(format!(
                "object key must not traverse directories: {key}"
            )));
        }
        Ok(self.root.join(clean))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn download(&self, key: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(key)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Object not found: {key}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read object: {key}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn upload(&self, key: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(key)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write object: {key}"),
                e,
            )
        })?;

        debug!(key, bytes = data.len(), "Wrote object");
        Ok(())
    }

    async fn upload_file(&self, key: &str, path: &Path) -> AppResult<()> {
        let full_path = self.resolve(key)?;
        self.ensure_parent(&full_path).await?;

        fs::copy(path, &full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to store file as object: {key}"),
                e,
            )
        })?;

        debug!(key, source = %path.display(), "Stored file as object");
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_path = self.resolve(key)?;
        Ok(fs::try_exists(&full_path).await.unwrap_or(false))
    }

    async fn size(&self, key: &str) -> AppResult<u64> {
        let full_path = self.resolve(key)?;
        let meta = fs::metadata(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Object not found: {key}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to stat object: {key}"),
                    e,
                )
            }
        })?;
        Ok(meta.len())
    }

    async fn sign_download_url(&self, key: &str, ttl: Duration) -> AppResult<String> {
        if !self.exists(key).await? {
            return Err(AppError::not_found(format!(
                "Cannot sign URL for missing object: {key}"
            )));
        }
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        let token = Uuid::new_v4().simple();
        Ok(format!("/api/files/{key}?expires={expires}&token={token}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, LocalObjectStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalObjectStore::new(dir.path().to_str().unwrap())
            .await
            .expect("create store");
        (dir, store)
    }

    #[tokio::test]
    async fn test_upload_download_roundtrip() {
        let (_dir, store) = store().await;
        store
            .upload("inputs/a.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        let data = store.download("inputs/a.txt").await.unwrap();
        assert_eq!(&data[..], b"hello");
        assert_eq!(store.size("inputs/a.txt").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let (_dir, store) = store().await;
        let err = store.download("missing.bin").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_key_traversal_rejected() {
        let (_dir, store) = store().await;
        let err = store.download("../etc/passwd").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_sign_url_requires_object() {
        let (_dir, store) = store().await;
        assert!(store
            .sign_download_url("ghost.pdf", Duration::from_secs(60))
            .await
            .is_err());

        store
            .upload("out.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        let url = store
            .sign_download_url("out.pdf", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("/api/files/out.pdf?expires="));
        assert!(url.contains("token="));
    }
}
