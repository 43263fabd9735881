//! Bundle resolution module
//!
//! A bundle is everything stored under `<id>/`: an `index.html` entry
//! document plus sibling assets. [`PageResolver`] turns an identifier into
//! the rewritten entry document, [`AssetRelay`] passes single assets through.
//! Both only read from the store.

pub mod relay;
pub mod resolver;
pub mod rewrite;

pub use relay::{AssetError, AssetRelay, RelayedAsset};
pub use resolver::{PageError, PageResolver, RewrittenDocument};

/// Entry document of every bundle
pub const INDEX_DOCUMENT: &str = "index.html";

/// Suffixes of asset-like requests that ended up on the page route
const RESERVED_SUFFIXES: [&str; 2] = [".webp", ".json"];

/// Whether `id` looks like a misrouted asset request
pub fn is_reserved_identifier(id: &str) -> bool {
    RESERVED_SUFFIXES.iter().any(|suffix| id.ends_with(suffix))
}

/// Key prefix shared by all objects of a bundle
pub fn bundle_prefix(id: &str) -> String {
    format!("{id}/")
}

/// Key of one object inside a bundle
pub fn object_key(id: &str, path: &str) -> String {
    format!("{id}/{path}")
}
