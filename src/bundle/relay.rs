//! Asset relay: (identifier, asset path) → stored bytes

use hyper::body::Bytes;
use std::sync::Arc;

use super::object_key;
use crate::http::cache::CachePolicy;
use crate::http::mime::OCTET_STREAM;
use crate::store::{ObjectStore, StoreError};

/// One object as it goes back to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedAsset {
    pub key: String,
    pub content_type: String,
    pub etag: Option<String>,
    pub cache: CachePolicy,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Caller broke the route contract; answered with 400
    #[error("missing id or asset parameter")]
    MissingParameter,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct AssetRelay {
    store: Arc<dyn ObjectStore>,
    cache: CachePolicy,
}

impl AssetRelay {
    pub fn new(store: Arc<dyn ObjectStore>, cache: CachePolicy) -> Self {
        Self { store, cache }
    }

    /// Fetch `<id>/<asset>` unchanged.
    pub async fn relay(&self, id: &str, asset: &str) -> Result<RelayedAsset, AssetError> {
        if id.is_empty() || asset.is_empty() {
            return Err(AssetError::MissingParameter);
        }

        let key = object_key(id, asset);
        let object = self.store.get_object(&key).await?;
        let Some(body) = object.body else {
            return Err(StoreError::MissingBody { key }.into());
        };

        Ok(RelayedAsset {
            key,
            content_type: object
                .content_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| OCTET_STREAM.to_string()),
            etag: object.etag,
            cache: self.cache,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    const LOGO: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    fn relay(store: &Arc<MemoryStore>) -> AssetRelay {
        let store: Arc<dyn ObjectStore> = Arc::clone(store) as Arc<dyn ObjectStore>;
        AssetRelay::new(store, CachePolicy::Public(3600))
    }

    #[tokio::test]
    async fn test_relay_returns_stored_bytes_and_type() {
        let store = Arc::new(MemoryStore::new().with_object(
            "card/img/logo.png",
            Some("image/png"),
            Bytes::from_static(LOGO),
        ));
        let asset = relay(&store).relay("card", "img/logo.png").await.unwrap();
        assert_eq!(asset.key, "card/img/logo.png");
        assert_eq!(asset.content_type, "image/png");
        assert_eq!(asset.body.as_ref(), LOGO);
        assert_eq!(asset.cache, CachePolicy::Public(3600));
    }

    #[tokio::test]
    async fn test_missing_content_type_defaults_to_binary() {
        let store = Arc::new(
            MemoryStore::new()
                .with_object("card/blob", None, "data")
                .with_object("card/blank", Some(""), "data"),
        );
        let relay = relay(&store);
        assert_eq!(
            relay.relay("card", "blob").await.unwrap().content_type,
            "application/octet-stream"
        );
        assert_eq!(
            relay.relay("card", "blank").await.unwrap().content_type,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_empty_parameters_are_bad_requests() {
        let store = Arc::new(MemoryStore::new().with_object("card/x", None, "x"));
        let relay = relay(&store);
        for (id, asset) in [("card", ""), ("", "x"), ("", "")] {
            assert!(matches!(
                relay.relay(id, asset).await,
                Err(AssetError::MissingParameter)
            ));
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_absent_asset_is_store_error() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            relay(&store).relay("card", "nope.css").await,
            Err(AssetError::Store(StoreError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_bodyless_object_is_store_error() {
        let store = Arc::new(MemoryStore::new().with_bodyless_object("card/x.js"));
        assert!(matches!(
            relay(&store).relay("card", "x.js").await,
            Err(AssetError::Store(StoreError::MissingBody { .. }))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_is_store_error() {
        let store = Arc::new(MemoryStore::failing("timeout"));
        assert!(matches!(
            relay(&store).relay("card", "x.js").await,
            Err(AssetError::Store(StoreError::S3 { .. }))
        ));
    }

    #[tokio::test]
    async fn test_etag_is_passed_through() {
        let store = Arc::new(MemoryStore::new().with_tagged_object("card/a.css", "\"v7\"", b"a{}"));
        let asset = relay(&store).relay("card", "a.css").await.unwrap();
        assert_eq!(asset.etag.as_deref(), Some("\"v7\""));
    }
}
