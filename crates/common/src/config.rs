//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Upload storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Default quota caps for new users and groups.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Administrator created at startup when missing.
    #[serde(default)]
    pub admin: Option<AdminBootstrapConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Where uploaded bytes are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory that stored paths are resolved against.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Sub-directory (relative to `root`) holding uploaded files.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
    /// Largest accepted request body for uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            uploads_dir: default_uploads_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Quota caps stamped onto newly created users and groups.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Items a new user may own.
    #[serde(default = "default_user_max_item_count")]
    pub user_max_item_count: i32,
    /// Space (MB) a new user may fill.
    #[serde(default = "default_user_max_item_space")]
    pub user_max_item_space: f64,
    /// Items a new group may hold.
    #[serde(default = "default_group_max_item_count")]
    pub group_max_item_count: i32,
    /// Space (MB) a new group may fill.
    #[serde(default = "default_group_max_item_space")]
    pub group_max_item_space: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            user_max_item_count: default_user_max_item_count(),
            user_max_item_space: default_user_max_item_space(),
            group_max_item_count: default_group_max_item_count(),
            group_max_item_space: default_group_max_item_space(),
        }
    }
}

/// Bootstrap administrator account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminBootstrapConfig {
    /// Login name.
    pub username: String,
    /// Initial password.
    pub password: String,
    /// First name.
    #[serde(default = "default_admin_name")]
    pub first_name: String,
    /// Last name.
    #[serde(default = "default_admin_name")]
    pub last_name: String,
    /// Contact address.
    pub email: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_storage_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

const fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

const fn default_user_max_item_count() -> i32 {
    20
}

const fn default_user_max_item_space() -> f64 {
    100.0
}

const fn default_group_max_item_count() -> i32 {
    100
}

const fn default_group_max_item_space() -> f64 {
    500.0
}

fn default_admin_name() -> String {
    "Admin".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `SPSHARE_ENV`)
    /// 3. Environment variables with `SPSHARE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("SPSHARE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SPSHARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("SPSHARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
