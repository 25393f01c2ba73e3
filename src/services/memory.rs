use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::services::storage::{ObjectStore, encode_key};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-process bucket for development and tests.
pub struct MemoryObjectStore {
    bucket: String,
    public_base_url: String,
    objects: DashMap<String, StoredObject>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        let public_base_url: String = public_base_url.into();
        Self {
            bucket: bucket.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            objects: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|o| o.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn store(&self, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn public_url(&self, key: &str) -> Result<String> {
        if !self.objects.contains_key(key) {
            return Err(anyhow!("not found"));
        }
        Ok(format!(
            "{}/{}/{}",
            self.public_base_url,
            self.bucket,
            encode_key(key)
        ))
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryObjectStore::new("image_uploader", "http://localhost:3000/objects/");
        store
            .store("a.txt", Bytes::from_static(b"one"), "text/plain")
            .await
            .unwrap();
        store
            .store("a.txt", Bytes::from_static(b"two"), "text/plain")
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a.txt").unwrap().data, Bytes::from_static(b"two"));
        assert_eq!(
            store.public_url("a.txt").await.unwrap(),
            "http://localhost:3000/objects/image_uploader/a.txt"
        );
    }

    #[tokio::test]
    async fn test_public_url_for_missing_object() {
        let store = MemoryObjectStore::new("b", "http://x");
        let err = store.public_url("ghost.png").await.unwrap_err();
        assert_eq!(err.to_string(), "not found");
    }
}
