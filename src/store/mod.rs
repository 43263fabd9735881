//! Object store module
//!
//! Bundles live under `<id>/` in an S3-compatible bucket. Request handlers only
//! talk to the [`ObjectStore`] trait so the bucket can be replaced by a local
//! directory during development, or by an in-memory double in tests.

mod body;
mod fs;
#[cfg(test)]
pub mod memory;
mod s3;

pub use fs::FsStore;
pub use s3::S3Store;

use async_trait::async_trait;
use hyper::body::Bytes;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ConfigurationError, StorageBackend, StorageConfig};

/// A single object as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// `Content-Type` recorded when the object was published
    pub content_type: Option<String>,
    /// Entity tag, quoted as the store returned it
    pub etag: Option<String>,
    /// Whole payload, `None` when the store answered without a body
    pub body: Option<Bytes>,
}

/// Failures surfaced by a store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object `{key}` not found")]
    NotFound { key: String },

    #[error("object `{key}` was returned without a body")]
    MissingBody { key: String },

    #[error("key `{key}` escapes the store root")]
    InvalidKey { key: String },

    #[error("failed to read body of `{key}`: {message}")]
    Body { key: String, message: String },

    #[error("I/O error on `{key}`")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store root `{}` is not a readable directory", path.display())]
    Root { path: PathBuf },

    #[error("{operation} failed for `{key}`: {message}")]
    S3 {
        operation: &'static str,
        key: String,
        message: String,
    },
}

/// Read access to a key-prefix object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List up to `max_keys` keys starting with `prefix`
    async fn list_keys(&self, prefix: &str, max_keys: usize) -> Result<Vec<String>, StoreError>;

    /// Fetch one object with its metadata and full body
    async fn get_object(&self, key: &str) -> Result<StoredObject, StoreError>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}

/// Error raised while building the store at startup
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build the configured store backend
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, ConnectError> {
    match config.backend {
        StorageBackend::S3 => {
            let settings = config.s3_settings()?;
            Ok(Arc::new(S3Store::connect(&settings).await))
        }
        StorageBackend::Fs => {
            let root = config.fs_root()?;
            Ok(Arc::new(FsStore::open(root)?))
        }
    }
}

/// Walk the error source chain and join all messages.
pub fn error_chain(err: &dyn Error) -> String {
    let mut msgs = vec![err.to_string()];
    let mut source = err.source();
    while let Some(s) = source {
        msgs.push(s.to_string());
        source = s.source();
    }
    msgs.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_includes_sources() {
        let err = StoreError::Io {
            key: "card/index.html".to_string(),
            source: std::io::Error::other("disk on fire"),
        };
        let chain = error_chain(&err);
        assert!(chain.starts_with("I/O error on `card/index.html`"));
        assert!(chain.ends_with(": disk on fire"));
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_credentials() {
        let config = crate::config::Config::load_with_env("does-not-exist", |name| {
            (name == "R2_ENDPOINT").then(|| "https://r2.example.com".to_string())
        })
        .unwrap();
        let result = connect(&config.storage).await;
        assert!(matches!(
            result,
            Err(ConnectError::Config(ConfigurationError::Missing(_)))
        ));
    }
}
