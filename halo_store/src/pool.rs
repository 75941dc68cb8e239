//! ABOUTME: Bounded client pool with acquire timeout and idle eviction
//! ABOUTME: Lends handles through an RAII guard so release cannot be missed

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use halo_core::{Error, Result};
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

/// Creates fresh client handles for the pool. Creation failures
/// propagate to the acquiring caller; nothing partial enters the pool.
#[async_trait]
pub trait ClientFactory<C>: Send + Sync {
    async fn create(&self) -> Result<C>;
}

/// Pool sizing and lifecycle options
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Maximum handles in existence (idle + lent)
    pub max_clients: usize,
    /// Pre-warmed floor the eviction sweep will not go below
    pub min_clients: usize,
    /// How long a handle may sit idle before eviction
    pub idle_timeout: Duration,
    /// How long an acquire waits before failing as exhausted
    pub acquire_timeout: Duration,
    /// Interval between idle eviction sweeps
    pub eviction_interval: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_clients: 10,
            min_clients: 2,
            idle_timeout: Duration::from_secs(30),
            acquire_timeout: Duration::from_secs(5),
            eviction_interval: Duration::from_secs(60),
        }
    }
}

impl From<&halo_config::PoolConfig> for PoolOptions {
    fn from(config: &halo_config::PoolConfig) -> Self {
        Self {
            max_clients: config.max_clients,
            min_clients: config.min_clients,
            idle_timeout: config.idle_timeout(),
            acquire_timeout: config.acquire_timeout(),
            eviction_interval: config.eviction_interval(),
        }
    }
}

struct IdleClient<C> {
    client: C,
    idle_since: Instant,
}

struct PoolInner<C> {
    idle: Vec<IdleClient<C>>,
    /// Handles in existence, lent ones included
    total: usize,
}

/// Snapshot of pool occupancy for logging and health endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub total: usize,
    pub idle: usize,
    pub in_use: usize,
}

/// Bounded pool of client handles.
///
/// Capacity is enforced by a semaphore; the idle queue lives behind a
/// std mutex held only across queue edits, never across awaits, so the
/// background sweep cannot race in-flight acquire/release calls.
pub struct ClientPool<C: Send + 'static> {
    factory: Arc<dyn ClientFactory<C>>,
    options: PoolOptions,
    semaphore: Arc<Semaphore>,
    inner: Arc<Mutex<PoolInner<C>>>,
    sweeper: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl<C: Send + 'static> ClientPool<C> {
    /// Construct the pool, pre-warm it to the configured minimum, and
    /// start the idle eviction sweep.
    pub async fn connect(
        factory: Arc<dyn ClientFactory<C>>,
        options: PoolOptions,
    ) -> Result<Arc<Self>> {
        if options.min_clients > options.max_clients {
            return Err(Error::Config(format!(
                "Pool min ({}) exceeds max ({})",
                options.min_clients, options.max_clients
            )));
        }

        let pool = Arc::new(Self {
            factory,
            semaphore: Arc::new(Semaphore::new(options.max_clients)),
            inner: Arc::new(Mutex::new(PoolInner {
                idle: Vec::new(),
                total: 0,
            })),
            sweeper: Mutex::new(None),
            options,
        });

        pool.warm().await?;
        pool.start_sweeper();

        debug!(
            max = pool.options.max_clients,
            min = pool.options.min_clients,
            "client pool ready"
        );
        Ok(pool)
    }

    async fn warm(&self) -> Result<()> {
        for _ in 0..self.options.min_clients {
            let client = self.factory.create().await?;
            let mut inner = self.lock_inner()?;
            inner.idle.push(IdleClient {
                client,
                idle_since: Instant::now(),
            });
            inner.total += 1;
        }
        Ok(())
    }

    fn lock_inner(&self) -> Result<std::sync::MutexGuard<'_, PoolInner<C>>> {
        self.inner
            .lock()
            .map_err(|e| Error::Store(format!("Pool lock poisoned: {}", e)))
    }

    /// Borrow a handle, waiting up to the acquire timeout for capacity.
    /// The handle returns to the pool when the guard drops, on every
    /// exit path.
    pub async fn acquire(&self) -> Result<PooledClient<C>> {
        let permit = match tokio::time::timeout(
            self.options.acquire_timeout,
            Arc::clone(&self.semaphore).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(Error::Store("Pool is closed".to_string())),
            Err(_) => {
                warn!(
                    timeout = ?self.options.acquire_timeout,
                    "pool exhausted, no client freed in time"
                );
                return Err(Error::PoolExhausted(format!(
                    "No client available within {:?}",
                    self.options.acquire_timeout
                )));
            }
        };

        let reused = self.lock_inner()?.idle.pop();
        let client = match reused {
            Some(idle) => idle.client,
            None => {
                // Under max thanks to the permit; create a fresh handle.
                // On factory failure the permit drops and capacity is
                // restored without pooling anything partial.
                let client = self.factory.create().await?;
                self.lock_inner()?.total += 1;
                client
            }
        };

        Ok(PooledClient {
            client: Some(client),
            inner: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Scoped acquisition: run `op` with a borrowed handle. The guard
    /// returns the handle on success, error, and early return alike.
    pub async fn with_client<T, F>(&self, op: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a C) -> BoxFuture<'a, Result<T>>,
    {
        let client = self.acquire().await?;
        let result = op(&*client).await;
        drop(client);
        result
    }

    /// Current occupancy
    pub fn status(&self) -> PoolStatus {
        match self.inner.lock() {
            Ok(inner) => PoolStatus {
                total: inner.total,
                idle: inner.idle.len(),
                in_use: inner.total - inner.idle.len(),
            },
            Err(_) => PoolStatus {
                total: 0,
                idle: 0,
                in_use: 0,
            },
        }
    }

    fn start_sweeper(self: &Arc<Self>) {
        let inner = Arc::clone(&self.inner);
        let options = self.options.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(options.eviction_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately, skip it
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Ok(mut inner) = inner.lock() else { break };

                let mut evicted = 0;
                let mut i = 0;
                while i < inner.idle.len() {
                    if inner.total > options.min_clients
                        && inner.idle[i].idle_since.elapsed() > options.idle_timeout
                    {
                        inner.idle.remove(i);
                        inner.total -= 1;
                        evicted += 1;
                    } else {
                        i += 1;
                    }
                }

                if evicted > 0 {
                    debug!(evicted, remaining = inner.total, "evicted idle clients");
                }
            }
        });

        if let Ok(mut sweeper) = self.sweeper.lock() {
            *sweeper = Some(handle);
        }
    }

    /// Stop the background eviction sweep. Lent handles still return
    /// normally; call during process shutdown.
    pub fn shutdown(&self) {
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
    }
}

impl<C: Send + 'static> std::fmt::Debug for ClientPool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientPool")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: Send + 'static> Drop for ClientPool<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// RAII guard around a lent handle. Dropping it pushes the handle back
/// onto the idle queue and releases the capacity permit.
pub struct PooledClient<C: Send + 'static> {
    client: Option<C>,
    inner: Arc<Mutex<PoolInner<C>>>,
    _permit: OwnedSemaphorePermit,
}

impl<C: Send + 'static> std::fmt::Debug for PooledClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledClient").finish_non_exhaustive()
    }
}

impl<C: Send + 'static> Deref for PooledClient<C> {
    type Target = C;

    fn deref(&self) -> &C {
        // Present from construction until drop
        self.client.as_ref().expect("pooled client already returned")
    }
}

impl<C: Send + 'static> Drop for PooledClient<C> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            if let Ok(mut inner) = self.inner.lock() {
                inner.idle.push(IdleClient {
                    client,
                    idle_since: Instant::now(),
                });
            }
            // On a poisoned lock the handle is dropped instead of pooled;
            // the permit still frees the capacity slot.
        }
    }
}
