//! In-memory object store for tests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use convertly_core::error::AppError;
use convertly_core::result::AppResult;
use convertly_core::traits::ObjectStore;

/// Object store over a concurrent in-process map.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, Bytes>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object synchronously (test setup helper).
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Bytes>) {
        self.objects.insert(key.into(), data.into());
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn download(&self, key: &str) -> AppResult<Bytes> {
        self.objects
            .get(key)
            .map(|entry| entry.clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))
    }

    async fn upload(&self, key: &str, data: Bytes) -> AppResult<()> {
        self.objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn upload_file(&self, key: &str, path: &Path) -> AppResult<()> {
        let data = tokio::fs::read(path).await?;
        self.objects.insert(key.to_string(), Bytes::from(data));
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.objects.contains_key(key))
    }

    async fn size(&self, key: &str) -> AppResult<u64> {
        self.objects
            .get(key)
            .map(|entry| entry.len() as u64)
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))
    }

    async fn sign_download_url(&self, key: &str, ttl: Duration) -> AppResult<String> {
        if !self.objects.contains_key(key) {
            return Err(AppError::not_found(format!(
                "Cannot sign URL for missing object: {key}"
            )));
        }
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        let token = Uuid::new_v4().simple();
        Ok(format!("/api/files/{key}?expires={expires}&token={token}"))
    }
}
