use std::path::PathBuf;

use common::media::s3::S3Config;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
    /// Maximum accepted size of a JSON request body, in bytes.
    pub json_body_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub access_token_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_ttl: i64,
    pub refresh_token_secret: String,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl: i64,
    /// Mark session cookies `Secure`. Disable only for plain-HTTP development.
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemStorageConfig {
    pub root: PathBuf,
    /// URL prefix under which `root` is reachable, e.g. `http://localhost:8000/media`.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for request bodies staged before they are handed to the store.
    pub staging_dir: PathBuf,
    /// Per-file upload limit in bytes.
    pub max_upload_size: u64,
    pub upload_timeout_secs: u64,
    /// `ffprobe` executable used to read video durations. Empty disables probing.
    pub ffprobe_bin: String,
    pub filesystem: FilesystemStorageConfig,
    pub s3: Option<S3Config>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("server.json_body_limit", 16 * 1024)?
            .set_default("database.max_connections", 20)?
            .set_default("auth.access_token_ttl", 24 * 60 * 60)?
            .set_default("auth.refresh_token_ttl", 10 * 24 * 60 * 60)?
            .set_default("auth.cookie_secure", true)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.staging_dir", "./data/staging")?
            .set_default("storage.max_upload_size", 256 * 1024 * 1024)?
            .set_default("storage.upload_timeout_secs", 300)?
            .set_default("storage.ffprobe_bin", "ffprobe")?
            .set_default("storage.filesystem.root", "./data/media")?
            .set_default(
                "storage.filesystem.public_base_url",
                "http://127.0.0.1:8000/media",
            )?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., VIDHUB__AUTH__ACCESS_TOKEN_SECRET)
            .add_source(
                Environment::with_prefix("VIDHUB")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins"),
            )
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.auth.validate()?;
        Ok(config)
    }
}

impl AuthConfig {
    /// Reject blank signing secrets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, secret) in [
            ("auth.access_token_secret", &self.access_token_secret),
            ("auth.refresh_token_secret", &self.refresh_token_secret),
        ] {
            if secret.trim().is_empty() {
                return Err(ConfigError::Message(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}
