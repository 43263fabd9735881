//! Page resolution: identifier → rewritten entry document

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::sync::Arc;

use super::{bundle_prefix, is_reserved_identifier, object_key, rewrite, INDEX_DOCUMENT};
use crate::store::{ObjectStore, StoreError};

/// Characters escaped when the identifier becomes a URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Entry document of a bundle with the base element injected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenDocument {
    pub id: String,
    pub html: String,
}

/// Why a page could not be resolved
///
/// Every variant is answered with the same 404; the distinction only
/// matters for logs and tests.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("`{0}` is not a page identifier")]
    InvalidIdentifier(String),

    #[error("no objects under prefix `{0}`")]
    BundleNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct PageResolver {
    store: Arc<dyn ObjectStore>,
    assets_prefix: String,
}

impl PageResolver {
    pub fn new(store: Arc<dyn ObjectStore>, assets_prefix: &str) -> Self {
        Self {
            store,
            assets_prefix: assets_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve `id` to its rewritten `index.html`.
    pub async fn resolve(&self, id: &str) -> Result<RewrittenDocument, PageError> {
        if id.is_empty() || is_reserved_identifier(id) {
            return Err(PageError::InvalidIdentifier(id.to_string()));
        }

        // Unknown identifiers stop here instead of costing a fetch
        let prefix = bundle_prefix(id);
        if self.store.list_keys(&prefix, 1).await?.is_empty() {
            return Err(PageError::BundleNotFound(prefix));
        }

        let key = object_key(id, INDEX_DOCUMENT);
        let object = self.store.get_object(&key).await?;
        let body = object.body.ok_or(StoreError::MissingBody { key })?;

        let source = String::from_utf8_lossy(&body);
        let html = rewrite::inject_base_href(&source, &self.base_href(id));

        Ok(RewrittenDocument {
            id: id.to_string(),
            html,
        })
    }

    /// URL every relative reference of the bundle resolves against
    pub fn base_href(&self, id: &str) -> String {
        format!(
            "{}/{}/",
            self.assets_prefix,
            utf8_percent_encode(id, SEGMENT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use pretty_assertions::assert_eq;

    const PAGE: &str = "<html><head></head><body>X</body></html>";

    fn resolver(store: &Arc<MemoryStore>) -> PageResolver {
        let store: Arc<dyn ObjectStore> = Arc::clone(store) as Arc<dyn ObjectStore>;
        PageResolver::new(store, "/api/assets")
    }

    fn card_store() -> Arc<MemoryStore> {
        Arc::new(
            MemoryStore::new()
                .with_object("foo/index.html", Some("text/html"), PAGE)
                .with_object("foo/style.css", Some("text/css"), "body{}"),
        )
    }

    #[tokio::test]
    async fn test_resolve_injects_base_href() {
        let store = card_store();
        let doc = resolver(&store).resolve("foo").await.unwrap();
        assert_eq!(doc.id, "foo");
        assert_eq!(
            doc.html,
            r#"<html><head><base href="/api/assets/foo/"></head><body>X</body></html>"#
        );
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_reserved_suffix_skips_store() {
        let store = card_store();
        let resolver = resolver(&store);
        for id in ["foo.webp", "foo.json", ""] {
            let err = resolver.resolve(id).await.unwrap_err();
            assert!(matches!(err, PageError::InvalidIdentifier(_)));
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_bundle_stops_after_listing() {
        let store = card_store();
        let err = resolver(&store).resolve("bar").await.unwrap_err();
        assert!(matches!(err, PageError::BundleNotFound(ref p) if p == "bar/"));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_prefix_is_not_a_substring_match() {
        let store = card_store();
        let err = resolver(&store).resolve("fo").await.unwrap_err();
        assert!(matches!(err, PageError::BundleNotFound(_)));
    }

    #[tokio::test]
    async fn test_bundle_without_index_is_store_error() {
        let store = Arc::new(MemoryStore::new().with_object("foo/logo.png", None, "png"));
        let err = resolver(&store).resolve("foo").await.unwrap_err();
        assert!(matches!(err, PageError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_body_is_an_error() {
        let store = Arc::new(MemoryStore::new().with_bodyless_object("foo/index.html"));
        let err = resolver(&store).resolve("foo").await.unwrap_err();
        assert!(matches!(
            err,
            PageError::Store(StoreError::MissingBody { ref key }) if key == "foo/index.html"
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let store = Arc::new(MemoryStore::failing("connection refused"));
        let err = resolver(&store).resolve("foo").await.unwrap_err();
        assert!(matches!(err, PageError::Store(StoreError::S3 { .. })));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decoded_lossily() {
        let store = Arc::new(MemoryStore::new().with_object(
            "foo/index.html",
            None,
            b"<head></head><p>\xff</p>".to_vec(),
        ));
        let doc = resolver(&store).resolve("foo").await.unwrap();
        assert!(doc.html.contains("<p>\u{fffd}</p>"));
    }

    #[test]
    fn test_base_href_encodes_identifier() {
        let store = card_store();
        let resolver = resolver(&store);
        assert_eq!(resolver.base_href("foo"), "/api/assets/foo/");
        assert_eq!(resolver.base_href("my card"), "/api/assets/my%20card/");
        assert_eq!(resolver.base_href("명함"), "/api/assets/%EB%AA%85%ED%95%A8/");
    }

    #[test]
    fn test_assets_prefix_trailing_slash() {
        let store: Arc<dyn ObjectStore> = card_store();
        let resolver = PageResolver::new(store, "/relay/");
        assert_eq!(resolver.base_href("foo"), "/relay/foo/");
    }
}
