//! ABOUTME: Store access layer: REST client, entity types, bounded pool
//! ABOUTME: All store traffic flows through pooled StoreClient handles

use async_trait::async_trait;
use halo_core::Result;
use std::sync::Arc;

pub mod client;
pub mod pool;
pub mod profiles;

pub use client::StoreClient;
pub use pool::{ClientFactory, ClientPool, PoolOptions, PoolStatus, PooledClient};
pub use profiles::{ProfileChanges, UserProfile};

/// Pool of store client handles, the shape the rest of the workspace uses
pub type StorePool = ClientPool<StoreClient>;

/// Production factory: each handle is an independent REST client against
/// the configured store endpoint.
pub struct StoreClientFactory {
    url: String,
    service_key: String,
}

impl StoreClientFactory {
    pub fn new(url: &str, service_key: &str) -> Self {
        Self {
            url: url.to_string(),
            service_key: service_key.to_string(),
        }
    }
}

#[async_trait]
impl ClientFactory<StoreClient> for StoreClientFactory {
    async fn create(&self) -> Result<StoreClient> {
        StoreClient::new(&self.url, &self.service_key)
    }
}

/// Build the production store pool from configuration.
pub async fn connect_pool(
    store: &halo_config::StoreConfig,
    pool: &halo_config::PoolConfig,
) -> Result<Arc<StorePool>> {
    let factory = Arc::new(StoreClientFactory::new(&store.url, &store.service_key));
    ClientPool::connect(factory, PoolOptions::from(pool)).await
}
