//! ABOUTME: Cache-aside orchestration for user profiles
//! ABOUTME: Read-through single gets, write-invalidate updates, batched reads

use futures_util::FutureExt;
use halo_cache::ProfileCache;
use halo_core::{now_rfc3339, Error, Result};
use halo_store::{ProfileChanges, StorePool, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Cache key prefix for user profiles
const CACHE_KEY_PREFIX: &str = "profile:";

fn cache_key(user_id: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, user_id)
}

/// Inbound update payload. May carry `id` and `created_at` from sloppy
/// callers; both are stripped before anything reaches the store, and a
/// mismatched `id` rejects the whole update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: Option<String>,
}

/// Stateless service in front of the profile store. All state lives in
/// the cache and the store; concurrent calls share only the pool and
/// the cache backend.
#[derive(Clone)]
pub struct ProfileService {
    cache: ProfileCache,
    pool: Arc<StorePool>,
    ttl: Duration,
}

impl ProfileService {
    pub fn new(cache: ProfileCache, pool: Arc<StorePool>, ttl: Duration) -> Self {
        Self { cache, pool, ttl }
    }

    /// Read-through profile lookup.
    ///
    /// Cache hits return without touching the store. Misses take a
    /// pooled client, read the row, and populate the cache before
    /// returning, so a repeat read within the TTL stays off the store.
    /// A missing row is `Ok(None)` and is never cached: a just-created
    /// profile must be visible on its first read.
    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let key = cache_key(user_id);

        if let Some(profile) = self.cache.get::<UserProfile>(&key).await {
            debug!(user_id = %user_id, "profile cache hit");
            return Ok(Some(profile));
        }

        let id = user_id.to_string();
        let fetched = self
            .pool
            .with_client(move |client| async move { client.fetch_profile(&id).await }.boxed())
            .await?;

        if let Some(profile) = &fetched {
            self.cache.set(&key, profile, self.ttl).await;
        }

        Ok(fetched)
    }

    /// Persist a partial update and invalidate the cached entry.
    ///
    /// The cache is deleted rather than rewritten: repopulating here
    /// could race a concurrent reader into caching a pre-write value,
    /// while a delete forces the next read back to the store. On any
    /// persistence failure the cache is left alone; whatever it holds
    /// is still accurate.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: UpdateProfileRequest,
    ) -> Result<UserProfile> {
        if let Some(payload_id) = &update.id {
            if payload_id != user_id {
                return Err(Error::IdentityMismatch(
                    "Cannot update another user's profile".to_string(),
                ));
            }
        }

        // `id` and `created_at` are dropped here no matter what the
        // caller sent; `updated_at` is stamped server-side.
        let changes = ProfileChanges {
            first_name: update.first_name,
            last_name: update.last_name,
            display_name: update.display_name,
            avatar_url: update.avatar_url,
            updated_at: Some(now_rfc3339()),
        };

        let id = user_id.to_string();
        let updated = self
            .pool
            .with_client(move |client| {
                async move { client.update_profile(&id, &changes).await }.boxed()
            })
            .await?
            .ok_or_else(|| Error::NotFound(format!("No profile for user {}", user_id)))?;

        self.cache.delete(&cache_key(user_id)).await;
        debug!(user_id = %user_id, "profile updated, cache invalidated");

        Ok(updated)
    }

    /// Batched lookup preserving input order.
    ///
    /// Cache lookups for all ids run concurrently; the misses go to the
    /// store as exactly one `id in (...)` query. Fresh rows are cached
    /// individually, then hits and fetches merge back into request
    /// order, silently dropping ids with no row. An empty input returns
    /// without touching cache or store.
    #[instrument(skip(self), fields(requested = user_ids.len()))]
    pub async fn get_profiles(&self, user_ids: &[String]) -> Result<Vec<UserProfile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let lookups = user_ids
            .iter()
            .map(|id| {
                let key = cache_key(id);
                async move { self.cache.get::<UserProfile>(&key).await }
            });
        let cached = futures_util::future::join_all(lookups).await;

        let mut by_id: HashMap<String, UserProfile> = HashMap::new();
        let mut missing: Vec<String> = Vec::new();
        for (id, hit) in user_ids.iter().zip(cached) {
            match hit {
                Some(profile) => {
                    by_id.insert(profile.id.clone(), profile);
                }
                None => missing.push(id.clone()),
            }
        }

        if !missing.is_empty() {
            debug!(misses = missing.len(), "batched store fetch for cache misses");
            let ids = missing.clone();
            let fetched = self
                .pool
                .with_client(move |client| {
                    async move { client.fetch_profiles(&ids).await }.boxed()
                })
                .await?;

            for profile in fetched {
                self.cache
                    .set(&cache_key(&profile.id), &profile, self.ttl)
                    .await;
                by_id.insert(profile.id.clone(), profile);
            }
        }

        Ok(user_ids
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect())
    }

    /// Drop every cached profile. Operational escape hatch after bulk
    /// store-side changes.
    pub async fn invalidate_all(&self) -> bool {
        self.cache
            .delete_pattern(&format!("{}*", CACHE_KEY_PREFIX))
            .await
    }
}
