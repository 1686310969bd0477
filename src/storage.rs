//! Object storage seam for the upload endpoint.
//!
//! Uploads are buffered in memory and forwarded to a remote object store
//! over HTTP. The trait keeps the transport swappable; `MemoryStorage`
//! backs the tests and local development without a bucket.

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

use crate::config::UploadConfig;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("storage rejected '{key}' with status {status}")]
    Rejected { key: String, status: u16 },
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}

/// Forwards objects to `{endpoint}/{bucket}/{key}` with a single PUT.
pub struct HttpObjectStorage {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    access_key: Option<String>,
}

impl HttpObjectStorage {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.storage_endpoint.trim_end_matches('/').to_string(),
            bucket: config.storage_bucket.clone(),
            access_key: config.storage_access_key.clone(),
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let url = format!("{}/{}/{}", self.endpoint, self.bucket, key);

        let mut request = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.access_key {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StorageError::Rejected {
                key: key.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(StoredObject { key: key.to_string(), url })
    }
}

/// In-memory sink used by tests and local development.
#[derive(Default)]
pub struct MemoryStorage {
    objects: std::sync::Mutex<Vec<StoredObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Vec<StoredObject> {
        self.objects.lock().expect("storage lock poisoned").clone()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(
        &self,
        key: &str,
        _bytes: Bytes,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let object = StoredObject {
            key: key.to_string(),
            url: format!("memory://{}", key),
        };
        self.objects
            .lock()
            .expect("storage lock poisoned")
            .push(object.clone());
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_records_every_put() {
        let storage = MemoryStorage::new();
        storage
            .put("a/one.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        storage
            .put("a/two.pdf", Bytes::from_static(b"pdf"), "application/pdf")
            .await
            .unwrap();

        let stored = storage.stored();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].url, "memory://a/one.png");
    }
}
