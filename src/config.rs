use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub profile_store: ProfileStoreSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileStoreSettings {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_cache_size() -> u64 {
    1000
}
fn default_cache_ttl() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Record passes durably; off by default, matching the ephemeral-pass
    /// browsing behavior.
    #[serde(default)]
    pub persist_passes: bool,
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            persist_passes: false,
            assistant_name: default_assistant_name(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_assistant_name() -> String {
    "AI assistant".to_string()
}
fn default_channel_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with B2B_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with B2B_)
            // e.g., B2B_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("B2B")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_env_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("B2B")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Fold well-known bare environment variables into the config
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    // DATABASE_URL wins over the config file, B2B_DATABASE__URL over both
    let database_url = env::var("B2B_DATABASE__URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = database_url {
        builder = builder.set_override("database.url", url)?;
    }
    if let Ok(endpoint) = env::var("B2B_PROFILE_STORE__ENDPOINT") {
        builder = builder.set_override("profile_store.endpoint", endpoint)?;
    }
    if let Ok(api_key) = env::var("B2B_PROFILE_STORE__API_KEY") {
        builder = builder.set_override("profile_store.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let engine = EngineSettings::default();
        assert!(!engine.persist_passes);
        assert_eq!(engine.assistant_name, "AI assistant");
        assert_eq!(engine.channel_capacity, 256);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }
}
