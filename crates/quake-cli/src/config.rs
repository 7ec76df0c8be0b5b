use anyhow::{Context, Result};
use quake_cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub show_timing: bool,
    pub max_rows: usize,
    pub output_format: OutputFormat,
    pub cache: CacheSettings,
    /// Shared Redis store; the in-process store is used when absent
    pub redis: Option<RedisSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => {
                anyhow::bail!("Unsupported output format: {} (use table, json or csv)", other)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_entries: usize,
    pub max_memory_mb: usize,
    pub store_timeout_ms: u64,
    pub query_timeout_ms: u64,
    pub key_prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            enabled: defaults.enabled,
            ttl_secs: defaults.ttl.as_secs(),
            max_entries: defaults.max_entries,
            max_memory_mb: defaults.max_memory_bytes / (1024 * 1024),
            store_timeout_ms: defaults.store_timeout.as_millis() as u64,
            query_timeout_ms: defaults.query_timeout.as_millis() as u64,
            key_prefix: defaults.key_prefix,
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_enabled(self.enabled)
            .with_ttl(Duration::from_secs(self.ttl_secs))
            .with_max_entries(self.max_entries)
            .with_max_memory(self.max_memory_mb * 1024 * 1024)
            .with_store_timeout(Duration::from_millis(self.store_timeout_ms))
            .with_query_timeout(Duration::from_millis(self.query_timeout_ms))
            .with_key_prefix(self.key_prefix.clone())
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    pub tls: bool,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            db: 0,
            tls: false,
        }
    }
}

impl std::fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("db", &self.db)
            .field("tls", &self.tls)
            .finish()
    }
}

/// Port of a managed Redis instance with TLS
const MANAGED_REDIS_PORT: u16 = 6380;

impl Default for Config {
    fn default() -> Self {
        Self {
            show_timing: true,
            max_rows: 1000,
            output_format: OutputFormat::Table,
            cache: CacheSettings::default(),
            redis: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` (or defaults), then apply `.env` and process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Override settings from environment variables looked up with `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(ttl) = var("QUAKE_CACHE_TTL") {
            self.cache.ttl_secs = ttl
                .trim()
                .parse()
                .with_context(|| format!("QUAKE_CACHE_TTL must be whole seconds, got '{}'", ttl))?;
        }

        if let Some(host) = var("REDIS_HOST").filter(|h| !h.trim().is_empty()) {
            let redis = self.redis.get_or_insert_with(|| RedisSettings {
                port: MANAGED_REDIS_PORT,
                tls: true,
                ..Default::default()
            });
            redis.host = host.trim().to_string();
        }

        if let Some(redis) = self.redis.as_mut() {
            if let Some(port) = var("REDIS_PORT") {
                redis.port = port
                    .trim()
                    .parse()
                    .with_context(|| format!("REDIS_PORT must be a port number, got '{}'", port))?;
            }
            if let Some(key) = var("REDIS_KEY") {
                redis.password = Some(key);
            }
            if let Some(tls) = var("REDIS_TLS") {
                redis.tls = parse_flag(&tls)
                    .with_context(|| format!("REDIS_TLS must be true or false, got '{}'", tls))?;
            }
        }

        Ok(())
    }

    pub fn cache_config(&self) -> CacheConfig {
        self.cache.to_cache_config()
    }

    #[cfg(feature = "redis")]
    pub fn redis_config(&self) -> Option<quake_cache::RedisConfig> {
        self.redis.as_ref().map(|r| {
            let config = quake_cache::RedisConfig::new(r.host.clone(), r.port)
                .with_db(r.db)
                .with_tls(r.tls)
                .with_prefix(self.cache.key_prefix.clone());
            match &r.password {
                Some(password) => config.with_password(password.clone()),
                None => config,
            }
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
