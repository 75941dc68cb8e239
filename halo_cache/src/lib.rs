//! ABOUTME: Cache store adapter over a pluggable key-value backend
//! ABOUTME: Never raises; every failure degrades to cache-miss behavior

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod backend;
pub mod events;

pub use backend::{CacheBackend, MemoryBackend, RedisBackend};
pub use events::{CacheEvent, CacheEventSink, RecordingSink, TracingSink};

/// Cache adapter for JSON-encoded values.
///
/// The cache is an optimization, never a correctness dependency: backend
/// failures, decode failures, and the disabled state all read as misses
/// (`None` / `false`) and are reported to the event sink instead of being
/// propagated. Callers always fall back to the source of truth.
#[derive(Clone)]
pub struct ProfileCache {
    backend: Option<Arc<dyn CacheBackend>>,
    events: Arc<dyn CacheEventSink>,
}

impl ProfileCache {
    pub fn new(backend: Arc<dyn CacheBackend>, events: Arc<dyn CacheEventSink>) -> Self {
        Self {
            backend: Some(backend),
            events,
        }
    }

    /// Adapter with no backend. Every get is a miss, every write a no-op
    /// returning `false`. Used when no cache URL is configured.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            events: Arc::new(TracingSink),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Fetch and deserialize a cached value. Absent, undecodable, or
    /// unreachable all surface as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = match &self.backend {
            Some(b) => b,
            None => {
                self.events.record(CacheEvent::Disabled { op: "get" });
                return None;
            }
        };

        let raw = match backend.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                self.events.record(CacheEvent::BackendError {
                    op: "get",
                    key: key.to_string(),
                    message: e.to_string(),
                });
                return None;
            }
        };

        let raw = match raw {
            Some(raw) => raw,
            None => {
                self.events.record(CacheEvent::Miss {
                    key: key.to_string(),
                });
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.events.record(CacheEvent::Hit {
                    key: key.to_string(),
                });
                Some(value)
            }
            Err(_) => {
                self.events.record(CacheEvent::DecodeError {
                    key: key.to_string(),
                });
                None
            }
        }
    }

    /// Serialize and store a value with an expiry. Returns whether the
    /// write actually happened.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let backend = match &self.backend {
            Some(b) => b,
            None => {
                self.events.record(CacheEvent::Disabled { op: "set" });
                return false;
            }
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                self.events.record(CacheEvent::BackendError {
                    op: "set",
                    key: key.to_string(),
                    message: format!("serialize failed: {}", e),
                });
                return false;
            }
        };

        match backend.set(key, &raw, ttl).await {
            Ok(()) => true,
            Err(e) => {
                self.events.record(CacheEvent::BackendError {
                    op: "set",
                    key: key.to_string(),
                    message: e.to_string(),
                });
                false
            }
        }
    }

    /// Remove a single entry. Returns whether the backend accepted the
    /// delete; a missing key still counts as success.
    pub async fn delete(&self, key: &str) -> bool {
        let backend = match &self.backend {
            Some(b) => b,
            None => {
                self.events.record(CacheEvent::Disabled { op: "delete" });
                return false;
            }
        };

        match backend.delete(key).await {
            Ok(()) => true,
            Err(e) => {
                self.events.record(CacheEvent::BackendError {
                    op: "delete",
                    key: key.to_string(),
                    message: e.to_string(),
                });
                false
            }
        }
    }

    /// Enumerate keys matching a glob pattern and delete them in one
    /// batch. No matches is a successful no-op.
    pub async fn delete_pattern(&self, pattern: &str) -> bool {
        let backend = match &self.backend {
            Some(b) => b,
            None => {
                self.events
                    .record(CacheEvent::Disabled { op: "delete_pattern" });
                return false;
            }
        };

        let keys = match backend.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                self.events.record(CacheEvent::BackendError {
                    op: "delete_pattern",
                    key: pattern.to_string(),
                    message: e.to_string(),
                });
                return false;
            }
        };

        if keys.is_empty() {
            return true;
        }

        match backend.delete_many(&keys).await {
            Ok(()) => true,
            Err(e) => {
                self.events.record(CacheEvent::BackendError {
                    op: "delete_pattern",
                    key: pattern.to_string(),
                    message: e.to_string(),
                });
                false
            }
        }
    }
}
