use std::num::NonZeroUsize;
use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;
use crate::infrastructure::observability::TracingConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub broker: BrokerSettings,
    pub jobs: JobsSettings,
    pub thumbnails: ThumbnailSettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Root of the vault tree uploads are relocated into.
    pub root: PathBuf,
    pub staging_dir: PathBuf,
    /// Holds the job ledger.
    pub state_dir: PathBuf,
}

impl StorageSettings {
    pub fn ledger_dir(&self) -> PathBuf {
        self.state_dir.join("jobs")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerProvider {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerSettings {
    pub provider: BrokerProvider,
    pub url: String,
    pub group: String,
    pub worker_consumer: String,
    pub status_consumer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsSettings {
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailSettings {
    pub cache_dir: PathBuf,
    pub size: u32,
    /// Unbounded when absent.
    pub max_entries: Option<NonZeroUsize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub username: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Defaults, then `appsettings.<env>.toml` if present, then `APP__`
    /// environment variables (`APP__SERVER__PORT=8080`).
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.max_upload_bytes", 10_u64 * 1024 * 1024 * 1024)?
            .set_default("storage.root", "./vault")?
            .set_default("storage.staging_dir", "./.staging")?
            .set_default("storage.state_dir", "./.job-state")?
            .set_default("broker.provider", "memory")?
            .set_default("broker.url", "redis://127.0.0.1:6379")?
            .set_default("broker.group", "vaultd")?
            .set_default("broker.worker_consumer", "ingest-worker")?
            .set_default("broker.status_consumer", "front-door")?
            .set_default("jobs.recent_limit", 100)?
            .set_default("thumbnails.cache_dir", "./.thumbnail-cache")?
            .set_default("thumbnails.size", 100)?
            .set_default("auth.username", "admin")?
            .set_default("logging.level", "info")?
            .set_default("logging.enable_json", false)?
            .add_source(File::with_name(&environment.settings_file()).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn tracing_config(&self, environment: Environment) -> TracingConfig {
        TracingConfig {
            environment: environment.to_string(),
            level: self.logging.level.clone(),
            json_format: self.logging.enable_json
                || std::env::var("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
        }
    }
}
