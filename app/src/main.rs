use halo_auth::{AuthService, IdentityClient};
use halo_cache::{ProfileCache, RedisBackend, TracingSink};
use halo_config::Config;
use halo_core::telemetry;
use halo_profile::ProfileService;
use halo_web::AppState;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    telemetry::init_tracing("development", "halo");
    tracing::info!("halo starting");

    // Load configuration - exit with non-zero if invalid
    let config = match Config::load() {
        Ok(config) => {
            tracing::debug!(?config, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        store_url = %config.store.url,
        cache_enabled = config.cache.enabled(),
        "Application configured and ready"
    );

    // Cache is optional: with no URL configured every read goes to the
    // store and the service still works.
    let cache = match &config.cache.url {
        Some(url) => {
            match RedisBackend::connect(url, config.cache.token.as_deref()).await {
                Ok(backend) => {
                    tracing::info!("Cache backend connected");
                    ProfileCache::new(Arc::new(backend), Arc::new(TracingSink))
                }
                Err(e) => {
                    // Startup continues; the adapter degrades to misses.
                    tracing::warn!("Cache backend unavailable, running without cache: {}", e);
                    ProfileCache::disabled()
                }
            }
        }
        None => {
            tracing::info!("No cache URL configured, running without cache");
            ProfileCache::disabled()
        }
    };

    // Store pool is not optional: without it no profile can be served.
    let pool = match halo_store::connect_pool(&config.store, &config.pool).await {
        Ok(pool) => {
            tracing::info!(status = ?pool.status(), "Store pool ready");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to initialize store pool: {}", e);
            process::exit(1);
        }
    };

    let identity = match IdentityClient::new(&config.identity.url, &config.identity.api_key) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!("Failed to initialize identity client: {}", e);
            process::exit(1);
        }
    };

    let state = AppState {
        profiles: ProfileService::new(cache, pool.clone(), config.cache.ttl()),
        auth: AuthService::new(identity),
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let result = halo_web::start_server(&bind_addr, state).await;

    pool.shutdown();

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        process::exit(1);
    }
}
