//! Local directory store backend
//!
//! Maps keys onto files below a root directory using the same layout as the
//! bucket (`<id>/index.html`, `<id>/<asset>`). Handy for previewing bundles
//! before publishing them.

use async_trait::async_trait;
use hyper::body::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::{ObjectStore, StoreError, StoredObject};
use crate::http::{cache, mime};

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, which must be an existing directory
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        match root.canonicalize() {
            Ok(canonical) if canonical.is_dir() => Ok(Self { root: canonical }),
            _ => Err(StoreError::Root {
                path: root.to_path_buf(),
            }),
        }
    }

    /// Resolve a key to a path inside the root
    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        // Keys are plain relative paths; anything else cannot be inside the root
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    /// Recursively collect keys below `dir` that start with `prefix`
    async fn walk(&self, dir: PathBuf, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut pending = vec![dir];
        while let Some(current) = pending.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(&self.key_of(&current), e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| io_error(prefix, e))?
            {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let key = self.key_of(&path);
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    /// Key for a path below the root, always `/`-separated
    fn key_of(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn list_keys(&self, prefix: &str, max_keys: usize) -> Result<Vec<String>, StoreError> {
        if max_keys == 0 {
            return Ok(Vec::new());
        }

        // Only the directory part of the prefix can be walked
        let dir_part = prefix.rsplit_once('/').map_or("", |(dir, _)| dir);
        let start = if dir_part.is_empty() {
            self.root.clone()
        } else {
            self.resolve(dir_part)?
        };

        // Bucket listings come back in key order
        let mut keys = self.walk(start, prefix).await?;
        keys.sort();
        keys.truncate(max_keys);
        Ok(keys)
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, StoreError> {
        let path = self.resolve(key)?;

        let Ok(canonical) = path.canonicalize() else {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        };
        if !canonical.starts_with(&self.root) {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        // Directories are prefixes, not objects
        if canonical.is_dir() {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }

        let content = match fs::read(&canonical).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(io_error(key, e)),
        };

        let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
        Ok(StoredObject {
            content_type: Some(content_type.to_string()),
            etag: Some(cache::generate_etag(&content)),
            body: Some(Bytes::from(content)),
        })
    }

    fn backend(&self) -> &'static str {
        "fs"
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}
