//! Server settings loaded with the `config` crate.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. A TOML file: `$REVIEWS_CONFIG` if set, otherwise `reviews.toml` if present
//! 3. Environment variables prefixed `REVIEWS__`, e.g. `REVIEWS__API__BASE_URL`

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use review_api::{ApiClientConfig, ReviewApiError};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::{CacheConfig, WatcherConfig};

/// Variable con la ruta del archivo de configuracion.
pub const CONFIG_PATH_ENV: &str = "REVIEWS_CONFIG";

const ENV_PREFIX: &str = "REVIEWS";
const DEFAULT_CONFIG_FILE: &str = "reviews";

/// Error al cargar o validar la configuracion.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid server address '{0}'")]
    InvalidAddress(String),

    #[error("invalid setting '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub watcher: WatcherSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL del API remoto de reviews.
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_capacity: u64,
    /// 0 = sin TTL
    pub ttl_seconds: u64,
    pub tti_seconds: Option<u64>,
    pub in_flight_shards: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub max_failures: u32,
    pub backoff_multiplier: f64,
    pub max_backoff_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            max_capacity: defaults.max_capacity,
            ttl_seconds: defaults.ttl_seconds,
            tti_seconds: defaults.tti_seconds,
            in_flight_shards: defaults.in_flight_shards,
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        let defaults = WatcherConfig::default();
        Self {
            enabled: true,
            interval_secs: defaults.interval.as_secs(),
            max_failures: defaults.max_failures,
            backoff_multiplier: defaults.backoff_multiplier,
            max_backoff_secs: defaults.max_backoff.as_secs(),
        }
    }
}

impl Settings {
    /// Carga la configuracion desde archivo y variables de entorno.
    pub fn load() -> Result<Self, SettingsError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::from_sources(path.as_deref().map(Path::new), None)
    }

    /// Carga desde un archivo opcional y un mapa de entorno explicito.
    ///
    /// `env = None` lee el entorno del proceso.
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let env_source = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let settings: Settings = Config::builder()
            .add_source(file_source)
            .add_source(env_source)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.api.timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "api.timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.cache.max_capacity == 0 {
            return Err(SettingsError::Invalid {
                key: "cache.max_capacity",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.watcher.enabled && self.watcher.interval_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "watcher.interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if !self.watcher.backoff_multiplier.is_finite() || self.watcher.backoff_multiplier < 1.0 {
            return Err(SettingsError::Invalid {
                key: "watcher.backoff_multiplier",
                message: "must be a finite number, 1.0 or greater".to_string(),
            });
        }
        if self.watcher.max_backoff_secs < self.watcher.interval_secs {
            return Err(SettingsError::Invalid {
                key: "watcher.max_backoff_secs",
                message: format!(
                    "must be at least watcher.interval_secs ({})",
                    self.watcher.interval_secs
                ),
            });
        }
        Ok(())
    }

    /// Direccion de escucha.
    pub fn socket_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = format!("{}:{}", self.server.host, self.server.port);
        raw.parse().map_err(|_| SettingsError::InvalidAddress(raw))
    }

    /// Configuracion del cliente HTTP del API remoto.
    pub fn api_config(&self) -> Result<ApiClientConfig, ReviewApiError> {
        let mut builder = ApiClientConfig::builder()
            .base_url(&self.api.base_url)
            .timeout(Duration::from_secs(self.api.timeout_secs));
        if let Some(key) = &self.api.api_key {
            builder = builder.api_key(key);
        }
        builder.build()
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl_seconds: self.cache.ttl_seconds,
            max_capacity: self.cache.max_capacity,
            tti_seconds: self.cache.tti_seconds,
            in_flight_shards: self.cache.in_flight_shards,
        }
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            interval: Duration::from_secs(self.watcher.interval_secs),
            max_failures: self.watcher.max_failures,
            backoff_multiplier: self.watcher.backoff_multiplier,
            max_backoff: Duration::from_secs(self.watcher.max_backoff_secs),
        }
    }
}
