//! In-memory store used by tests

use async_trait::async_trait;
use hyper::body::Bytes;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ObjectStore, StoreError, StoredObject};

#[derive(Default)]
pub struct MemoryStore {
    objects: BTreeMap<String, StoredObject>,
    failure: Option<&'static str>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object with a body
    pub fn with_object(
        mut self,
        key: &str,
        content_type: Option<&str>,
        body: impl Into<Bytes>,
    ) -> Self {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.map(ToString::to_string),
                etag: None,
                body: Some(body.into()),
            },
        );
        self
    }

    /// Add an object with an explicit entity tag
    pub fn with_tagged_object(mut self, key: &str, etag: &str, body: &'static [u8]) -> Self {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                content_type: None,
                etag: Some(etag.to_string()),
                body: Some(Bytes::from_static(body)),
            },
        );
        self
    }

    /// Add an object the store reports without a body
    pub fn with_bodyless_object(mut self, key: &str) -> Self {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                content_type: Some("text/html".to_string()),
                etag: None,
                body: None,
            },
        );
        self
    }

    /// Make every call fail like an unreachable endpoint
    pub fn failing(message: &'static str) -> Self {
        Self {
            failure: Some(message),
            ..Self::default()
        }
    }

    /// Number of store calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, operation: &'static str, key: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(message) => Err(StoreError::S3 {
                operation,
                key: key.to_string(),
                message: message.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_keys(&self, prefix: &str, max_keys: usize) -> Result<Vec<String>, StoreError> {
        self.record("ListObjectsV2", prefix)?;
        Ok(self
            .objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .take(max_keys)
            .cloned()
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StoreError> {
        self.record("GetObject", key)?;
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
