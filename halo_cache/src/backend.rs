//! ABOUTME: Cache backend implementations behind a common trait
//! ABOUTME: Redis for shared deployments, in-memory LRU for single-instance

use async_trait::async_trait;
use halo_core::{Error, Result};
use linked_hash_map::LinkedHashMap;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Key-value backend the cache adapter talks to. All values are UTF-8
/// JSON strings; TTL handling is the backend's responsibility.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Enumerate keys matching a glob-style pattern
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
    /// Delete a batch of keys in one backend round-trip
    async fn delete_many(&self, keys: &[String]) -> Result<()>;
}

/// Redis-backed cache speaking GET / SET EX / DEL / KEYS
#[derive(Clone)]
pub struct RedisBackend {
    manager: redis::aio::ConnectionManager,
}

impl RedisBackend {
    /// Connect to a Redis endpoint. An access token, when present, is
    /// applied as the connection password.
    pub async fn connect(cache_url: &str, token: Option<&str>) -> Result<Self> {
        let mut url = url::Url::parse(cache_url)
            .map_err(|e| Error::Config(format!("Invalid cache URL: {}", e)))?;
        if let Some(token) = token {
            url.set_password(Some(token))
                .map_err(|_| Error::Config("Cache URL does not accept a token".to_string()))?;
        }

        let client = redis::Client::open(url.as_str())
            .map_err(|e| Error::Cache(format!("Failed to open cache client: {}", e)))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::Cache(format!("Failed to connect to cache: {}", e)))?;

        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| Error::Cache(format!("GET failed: {}", e)))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.set_ex(key, value, ttl.as_secs())
            .await
            .map_err(|e| Error::Cache(format!("SET failed: {}", e)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del(key)
            .await
            .map_err(|e| Error::Cache(format!("DEL failed: {}", e)))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.manager.clone();
        conn.keys(pattern)
            .await
            .map_err(|e| Error::Cache(format!("KEYS failed: {}", e)))
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        conn.del(keys)
            .await
            .map_err(|e| Error::Cache(format!("DEL failed: {}", e)))
    }
}

/// Cache entry with TTL support
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// In-process LRU store with per-entry TTL. Suitable for single-instance
/// deployments and for tests; entries evaporate with the process.
#[derive(Debug)]
pub struct MemoryBackend {
    inner: RwLock<MemoryInner>,
}

#[derive(Debug)]
struct MemoryInner {
    data: HashMap<String, CacheEntry>,
    access_order: LinkedHashMap<String, ()>,
    max_size: usize,
}

impl MemoryBackend {
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                data: HashMap::new(),
                access_order: LinkedHashMap::new(),
                max_size,
            }),
        }
    }

    /// Number of live entries, expired ones included until touched
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a key currently holds an unexpired entry
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .read()
            .map(|i| i.data.get(key).map(|e| !e.is_expired()).unwrap_or(false))
            .unwrap_or(false)
    }
}

impl MemoryInner {
    fn get(&mut self, key: &str) -> Option<String> {
        if let Some(entry) = self.data.get(key) {
            if !entry.is_expired() {
                // Move to back (most recently used)
                self.access_order.remove(key);
                self.access_order.insert(key.to_string(), ());
                return Some(entry.value.clone());
            }
            // Drop the expired entry on the way out
            self.data.remove(key);
            self.access_order.remove(key);
        }
        None
    }

    fn put(&mut self, key: String, value: String, ttl: Duration) {
        if self.data.remove(&key).is_some() {
            self.access_order.remove(&key);
        }

        // Evict least recently used if at capacity
        while self.data.len() >= self.max_size {
            if let Some((lru_key, _)) = self.access_order.pop_front() {
                self.data.remove(&lru_key);
            } else {
                break;
            }
        }

        self.data.insert(key.clone(), CacheEntry::new(value, ttl));
        self.access_order.insert(key, ());
    }

    fn invalidate(&mut self, key: &str) {
        if self.data.remove(key).is_some() {
            self.access_order.remove(key);
        }
    }
}

/// Glob match supporting only the `*` wildcard, which is all the
/// `profile:*` namespace requires.
fn glob_match(pattern: &str, key: &str) -> bool {
    let mut remaining = key;
    let mut parts = pattern.split('*').peekable();

    // Literal prefix must anchor at the start
    if let Some(first) = parts.next() {
        if !remaining.starts_with(first) {
            return false;
        }
        remaining = &remaining[first.len()..];
        if parts.peek().is_none() {
            return remaining.is_empty();
        }
    }

    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            // Last literal must anchor at the end
            return part.is_empty() || remaining.ends_with(part);
        }
        match remaining.find(part) {
            Some(idx) => remaining = &remaining[idx + part.len()..],
            None => return false,
        }
    }
    true
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| Error::Cache(format!("Cache lock poisoned: {}", e)))?;
        Ok(inner.get(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| Error::Cache(format!("Cache lock poisoned: {}", e)))?;
        inner.put(key.to_string(), value.to_string(), ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| Error::Cache(format!("Cache lock poisoned: {}", e)))?;
        inner.invalidate(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| Error::Cache(format!("Cache lock poisoned: {}", e)))?;
        Ok(inner
            .data
            .iter()
            .filter(|(k, e)| !e.is_expired() && glob_match(pattern, k))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| Error::Cache(format!("Cache lock poisoned: {}", e)))?;
        for key in keys {
            inner.invalidate(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lru_eviction_order() {
        let backend = MemoryBackend::new(3);
        let ttl = Duration::from_secs(60);
        backend.set("a", "1", ttl).await.unwrap();
        backend.set("b", "2", ttl).await.unwrap();
        backend.set("c", "3", ttl).await.unwrap();

        // Access 'a' to refresh its position
        assert_eq!(backend.get("a").await.unwrap(), Some("1".to_string()));

        // Adding a fourth entry should evict 'b'
        backend.set("d", "4", ttl).await.unwrap();

        assert_eq!(backend.get("b").await.unwrap(), None);
        assert_eq!(backend.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(backend.get("c").await.unwrap(), Some("3".to_string()));
        assert_eq!(backend.get("d").await.unwrap(), Some("4".to_string()));
    }

    #[tokio::test]
    async fn expired_entries_read_as_misses() {
        let backend = MemoryBackend::new(10);
        backend
            .set("ephemeral", "x", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(backend.get("ephemeral").await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_matches_wildcard_patterns() {
        let backend = MemoryBackend::new(10);
        let ttl = Duration::from_secs(60);
        backend.set("profile:a", "1", ttl).await.unwrap();
        backend.set("profile:b", "2", ttl).await.unwrap();
        backend.set("session:a", "3", ttl).await.unwrap();

        let mut matched = backend.keys("profile:*").await.unwrap();
        matched.sort();
        assert_eq!(matched, vec!["profile:a", "profile:b"]);

        backend
            .delete_many(&matched.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .await
            .unwrap();
        assert_eq!(backend.keys("profile:*").await.unwrap().len(), 0);
        assert!(backend.contains("session:a"));
    }

    #[test]
    fn glob_match_anchors_both_ends() {
        assert!(glob_match("profile:*", "profile:123"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("profile:*:v2", "profile:abc:v2"));
        assert!(!glob_match("profile:*", "session:123"));
        assert!(!glob_match("profile:x", "profile:xy"));
        assert!(glob_match("profile:x", "profile:x"));
    }
}
