// Configuration module entry point
// Loads layered configuration and holds the per-process application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, ConfigurationError, HealthConfig, HttpConfig, LoggingConfig, PerformanceConfig,
    RoutesConfig, S3Settings, ServerConfig, StorageBackend, StorageConfig,
};

/// Conventional store variables, applied over file and `SHIM_*` settings
const STORE_ENV_OVERRIDES: [(&str, &str); 4] = [
    ("R2_ENDPOINT", "storage.endpoint"),
    ("R2_ACCESS_KEY_ID", "storage.access_key_id"),
    ("R2_SECRET_ACCESS_KEY", "storage.secret_access_key"),
    ("R2_BUCKET_NAME", "storage.bucket"),
];

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::load_from`] with an explicit lookup for the store variables
    pub fn load_with_env(
        config_path: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SHIM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "bundle-shim")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB, only GET is served
            .set_default("http.asset_max_age", 3600)?
            .set_default("routes.assets_prefix", "/api/assets")?
            .set_default("storage.backend", "s3")?
            .set_default("storage.region", "auto")?;

        for (variable, key) in STORE_ENV_OVERRIDES {
            builder = builder.set_override_option(key, env(variable))?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Fail fast on settings the object store cannot start without
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.storage.backend {
            StorageBackend::S3 => self.storage.s3_settings().map(|_| ()),
            StorageBackend::Fs => self.storage.fs_root().map(|_| ()),
        }
    }
}

impl StorageConfig {
    /// Collect the S3 settings, naming the first one that is missing or blank
    pub fn s3_settings(&self) -> Result<S3Settings, ConfigurationError> {
        Ok(S3Settings {
            endpoint: required(self.endpoint.as_deref(), "storage.endpoint")?,
            region: required(Some(self.region.as_str()), "storage.region")?,
            access_key_id: required(self.access_key_id.as_deref(), "storage.access_key_id")?,
            secret_access_key: required(
                self.secret_access_key.as_deref(),
                "storage.secret_access_key",
            )?,
            bucket: required(self.bucket.as_deref(), "storage.bucket")?,
        })
    }

    pub fn fs_root(&self) -> Result<String, ConfigurationError> {
        required(self.root.as_deref(), "storage.root")
    }
}

fn required(value: Option<&str>, name: &'static str) -> Result<String, ConfigurationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigurationError::Missing(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_with_env("does-not-exist", no_env).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.routes.assets_prefix, "/api/assets");
        assert_eq!(cfg.http.asset_max_age, 3600);
        assert_eq!(cfg.storage.backend, StorageBackend::S3);
        assert_eq!(cfg.storage.region, "auto");
        assert!(cfg.routes.health.enabled);
    }

    #[test]
    fn test_file_values_are_loaded() {
        let file = write_config(
            r#"
[server]
port = 9090

[storage]
backend = "fs"
root = "/srv/bundles"
"#,
        );
        let cfg = Config::load_with_env(file.path().to_str().unwrap(), no_env).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.storage.backend, StorageBackend::Fs);
        assert_eq!(cfg.storage.root.as_deref(), Some("/srv/bundles"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_store_variables_override_file() {
        let file = write_config(
            r#"
[storage]
bucket = "from-file"
"#,
        );
        let env: HashMap<&str, &str> = HashMap::from([
            ("R2_ENDPOINT", "https://account.r2.example.com"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "secret"),
            ("R2_BUCKET_NAME", "cards"),
        ]);
        let cfg = Config::load_with_env(file.path().to_str().unwrap(), |name| {
            env.get(name).map(ToString::to_string)
        })
        .unwrap();

        let settings = cfg.storage.s3_settings().unwrap();
        assert_eq!(settings.bucket, "cards");
        assert_eq!(settings.endpoint, "https://account.r2.example.com");
        assert_eq!(settings.access_key_id, "key");
        assert_eq!(settings.secret_access_key, "secret");
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let cfg = Config::load_with_env("does-not-exist", |name| match name {
            "R2_ENDPOINT" => Some("https://r2.example.com".to_string()),
            "R2_BUCKET_NAME" => Some("cards".to_string()),
            "R2_SECRET_ACCESS_KEY" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(
            cfg.validate(),
            Err(ConfigurationError::Missing("storage.access_key_id"))
        );
    }

    #[test]
    fn test_blank_secret_is_missing() {
        let cfg = Config::load_with_env("does-not-exist", |name| match name {
            "R2_SECRET_ACCESS_KEY" => Some("  ".to_string()),
            _ => Some("value".to_string()),
        })
        .unwrap();
        assert_eq!(
            cfg.storage.s3_settings().err(),
            Some(ConfigurationError::Missing("storage.secret_access_key"))
        );
    }

    #[test]
    fn test_fs_backend_requires_root() {
        let file = write_config("[storage]\nbackend = \"fs\"\n");
        let cfg = Config::load_with_env(file.path().to_str().unwrap(), no_env).unwrap();
        assert_eq!(
            cfg.validate(),
            Err(ConfigurationError::Missing("storage.root"))
        );
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let cfg = Config::load_with_env("does-not-exist", |name| match name {
            "R2_SECRET_ACCESS_KEY" => Some("hunter2".to_string()),
            _ => None,
        })
        .unwrap();
        let debug = format!("{:?}", cfg.storage);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::load_with_env("does-not-exist", no_env).unwrap();
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
    }
}
