//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Handles all application settings from environment variables and files

use config::{Config as ConfigBuilder, Environment, File};
use halo_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub store: StoreConfig,
    #[validate(nested)]
    pub pool: PoolConfig,
    #[validate(nested)]
    pub cache: CacheConfig,
    #[validate(nested)]
    pub identity: IdentityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Profile store configuration with secret redaction
#[derive(Clone, Deserialize, Serialize, Validate)]
pub struct StoreConfig {
    /// Base URL of the store's REST endpoint
    #[validate(url)]
    pub url: String,
    /// Privileged credential for server-side access
    pub service_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            service_key: String::new(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

/// Client pool sizing and lifecycle
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PoolConfig {
    /// Maximum client handles
    #[validate(range(min = 1, max = 100))]
    pub max_clients: usize,
    /// Pre-warmed minimum kept across idle eviction
    #[validate(range(max = 100))]
    pub min_clients: usize,
    /// Seconds a handle may sit idle before the sweep removes it
    #[validate(range(min = 1, max = 3600))]
    pub idle_timeout_secs: u64,
    /// Seconds an acquire waits before failing as exhausted
    #[validate(range(min = 1, max = 300))]
    pub acquire_timeout_secs: u64,
    /// Seconds between idle eviction sweeps
    #[validate(range(min = 1, max = 3600))]
    pub eviction_interval_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_clients: 10,
            min_clients: 2,
            idle_timeout_secs: 30,
            acquire_timeout_secs: 5,
            eviction_interval_secs: 60,
        }
    }
}

impl PoolConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }
}

/// Cache backend configuration with secret redaction
///
/// An absent `url` disables caching entirely; every lookup then behaves
/// as a miss and reads go straight to the store.
#[derive(Clone, Deserialize, Serialize, Validate)]
pub struct CacheConfig {
    #[validate(url)]
    pub url: Option<String>,
    pub token: Option<String>,
    /// Default TTL for cached profiles, in seconds
    #[validate(range(min = 1, max = 604800))]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            ttl_seconds: 3600,
        }
    }
}

impl CacheConfig {
    pub fn enabled(&self) -> bool {
        self.url.is_some()
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

/// Identity provider configuration with secret redaction
#[derive(Clone, Deserialize, Serialize, Validate)]
pub struct IdentityConfig {
    #[validate(url)]
    pub url: String,
    pub api_key: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables and optional .env file
    pub fn load() -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // Set defaults first
        builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("store.url", "http://localhost:54321")?
            .set_default("store.service_key", "")?
            .set_default("pool.max_clients", 10)?
            .set_default("pool.min_clients", 2)?
            .set_default("pool.idle_timeout_secs", 30)?
            .set_default("pool.acquire_timeout_secs", 5)?
            .set_default("pool.eviction_interval_secs", 60)?
            .set_default("cache.ttl_seconds", 3600)?
            .set_default("identity.url", "http://localhost:54321")?
            .set_default("identity.api_key", "")?;

        // Multi-word keys clash with the env separator, handle them explicitly
        for (var, key) in [
            ("HALO_STORE_SERVICE_KEY", "store.service_key"),
            ("HALO_POOL_MAX_CLIENTS", "pool.max_clients"),
            ("HALO_POOL_MIN_CLIENTS", "pool.min_clients"),
            ("HALO_POOL_IDLE_TIMEOUT_SECS", "pool.idle_timeout_secs"),
            ("HALO_POOL_ACQUIRE_TIMEOUT_SECS", "pool.acquire_timeout_secs"),
            (
                "HALO_POOL_EVICTION_INTERVAL_SECS",
                "pool.eviction_interval_secs",
            ),
            ("HALO_CACHE_TTL_SECONDS", "cache.ttl_seconds"),
            ("HALO_CACHE_URL", "cache.url"),
            ("HALO_CACHE_TOKEN", "cache.token"),
            ("HALO_IDENTITY_API_KEY", "identity.api_key"),
        ] {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        // Try to load from .env file if it exists (optional)
        if std::path::Path::new(".env").exists() {
            builder = builder.add_source(File::with_name(".env").required(false));
        }

        // Load from environment variables with HALO_ prefix (highest priority)
        builder = builder.add_source(
            Environment::with_prefix("HALO")
                .try_parsing(true)
                .separator("_"),
        );

        let config = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

        let parsed: Config = config
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))?;

        parsed
            .validate()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))?;

        Ok(parsed)
    }
}
