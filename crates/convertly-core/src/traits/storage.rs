//! Object storage gateway trait.
//!
//! Transformation functions stage their input and output through this
//! seam; the status endpoint uses it to mint time-limited download URLs.
//! The [`ObjectStore`] trait is defined here in `convertly-core` and
//! implemented in `convertly-storage`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for object storage backends.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Download an object into memory as a complete byte vector.
    async fn download(&self, key: &str) -> AppResult<Bytes>;

    /// Upload bytes under the given key.
    async fn upload(&self, key: &str, data: Bytes) -> AppResult<()>;

    /// Upload a local file under the given key.
    async fn upload_file(&self, key: &str, path: &Path) -> AppResult<()>;

    /// Check whether an object exists for the given key.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Return the size in bytes of the object at the given key.
    async fn size(&self, key: &str) -> AppResult<u64>;

    /// Mint a time-limited download URL for the object at the given key.
    async fn sign_download_url(&self, key: &str, ttl: Duration) -> AppResult<String>;
}
