// Application state module
// Holds the loaded configuration and the request-handling components

use std::sync::Arc;

use super::types::Config;
use crate::bundle::{AssetRelay, PageResolver};
use crate::http::cache::CachePolicy;
use crate::store::ObjectStore;

/// Application state
///
/// Shared read-only between connections. The only collaborator the
/// components have is the object store, built once at startup.
pub struct AppState {
    pub config: Config,
    pub resolver: PageResolver,
    pub relay: AssetRelay,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ObjectStore>) -> Self {
        let resolver = PageResolver::new(Arc::clone(&store), &config.routes.assets_prefix);
        let relay = AssetRelay::new(store, CachePolicy::Public(config.http.asset_max_age));

        Self {
            config,
            resolver,
            relay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::io::Write;

    #[tokio::test]
    async fn test_state_follows_loaded_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            b"[logging]\naccess_log = false\n\n[http]\nasset_max_age = 60\n\n[routes]\nassets_prefix = \"/relay\"\n",
        )
        .unwrap();
        let config = Config::load_with_env(file.path().to_str().unwrap(), |_| None).unwrap();

        let store: Arc<dyn ObjectStore> = Arc::new(
            MemoryStore::new()
                .with_object("card/index.html", None, "<head></head>")
                .with_object("card/a.css", Some("text/css"), "a{}"),
        );
        let state = AppState::new(config, store);
        assert!(!state.config.logging.access_log);

        let asset = state.relay.relay("card", "a.css").await.unwrap();
        assert_eq!(asset.cache, CachePolicy::Public(60));
        assert_eq!(state.resolver.base_href("card"), "/relay/card/");
    }
}
