//! Redis-backed result store
//!
//! Only compiled with the `redis` feature. Entries are written with `SETEX`
//! so Redis owns expiry; every failure maps to `CacheUnavailable`.

use crate::fingerprint::CacheKey;
use crate::store::{ttl_secs, CacheStore};
use async_trait::async_trait;
use quake_core::{QuakeError, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::time::Duration;
use tracing::info;

/// Redis connection settings
#[derive(Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    /// Connect over TLS
    pub tls: bool,
    /// Namespace for cache keys
    pub prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            db: 0,
            tls: false,
            prefix: "quake".to_string(),
        }
    }
}

impl RedisConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Connection details handed to the redis client
    pub fn connection_info(&self) -> ConnectionInfo {
        let addr = if self.tls {
            ConnectionAddr::TcpTls {
                host: self.host.clone(),
                port: self.port,
                insecure: false,
                tls_params: None,
            }
        } else {
            ConnectionAddr::Tcp(self.host.clone(), self.port)
        };

        ConnectionInfo {
            addr,
            redis: RedisConnectionInfo {
                db: self.db,
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

impl std::fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("db", &self.db)
            .field("tls", &self.tls)
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Result store backed by a shared Redis instance
pub struct RedisCacheStore {
    manager: ConnectionManager,
    config: RedisConfig,
}

impl RedisCacheStore {
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.connection_info()).map_err(unavailable)?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(unavailable)?;

        info!(
            "Connected to Redis cache at {}:{} (tls: {})",
            config.host, config.port, config.tls
        );

        Ok(Self { manager, config })
    }

    fn make_key(&self, key: &CacheKey) -> String {
        key.namespaced(&self.config.prefix)
    }
}

fn unavailable(err: redis::RedisError) -> QuakeError {
    QuakeError::CacheUnavailable(err.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<Vec<u8>>>(self.make_key(key))
            .await
            .map_err(unavailable)
    }

    async fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(self.make_key(key), value, ttl_secs(ttl))
            .await
            .map_err(unavailable)
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn.del(self.make_key(key)).await.map_err(unavailable)?;
        Ok(removed > 0)
    }

    fn name(&self) -> &str {
        "redis"
    }
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_connection_info() {
        let info = RedisConfig::new("localhost", 6379).with_db(2).connection_info();
        assert!(matches!(
            info.addr,
            ConnectionAddr::Tcp(ref host, 6379) if host == "localhost"
        ));
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password, None);
    }

    #[test]
    fn test_tls_connection_info_keeps_password_verbatim() {
        let info = RedisConfig::new("cache.example.net", 6380)
            .with_password("a+b/c=@:%")
            .with_tls(true)
            .connection_info();
        assert!(matches!(
            info.addr,
            ConnectionAddr::TcpTls { ref host, port: 6380, insecure: false, .. }
                if host == "cache.example.net"
        ));
        assert_eq!(info.redis.password.as_deref(), Some("a+b/c=@:%"));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = RedisConfig::default().with_password("secret");
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
