//! ABOUTME: Structured event sink for cache degrade paths
//! ABOUTME: Makes swallowed backend failures observable to tests and operators

use std::sync::Mutex;
use tracing::{debug, warn};

/// Something the cache adapter wants to report without raising an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Hit { key: String },
    Miss { key: String },
    /// Backend call failed; the operation degraded to miss/false.
    BackendError {
        op: &'static str,
        key: String,
        message: String,
    },
    /// Stored value failed to deserialize; treated as a miss.
    DecodeError { key: String },
    /// Adapter is disabled (no cache configured); the call was a no-op.
    Disabled { op: &'static str },
}

/// Collaborator the adapter reports events to. The cache never raises,
/// so this is the only window into its failure behavior.
pub trait CacheEventSink: Send + Sync {
    fn record(&self, event: CacheEvent);
}

/// Default sink: forwards events to tracing.
#[derive(Debug, Default)]
pub struct TracingSink;

impl CacheEventSink for TracingSink {
    fn record(&self, event: CacheEvent) {
        match event {
            CacheEvent::Hit { key } => debug!(key = %key, "cache hit"),
            CacheEvent::Miss { key } => debug!(key = %key, "cache miss"),
            CacheEvent::BackendError { op, key, message } => {
                warn!(op = %op, key = %key, error = %message, "cache backend error, degrading")
            }
            CacheEvent::DecodeError { key } => {
                warn!(key = %key, "cached value failed to decode, treating as miss")
            }
            CacheEvent::Disabled { op } => debug!(op = %op, "cache disabled, skipping"),
        }
    }
}

/// Test sink that records every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CacheEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().expect("event sink poisoned").clone()
    }

    pub fn count_errors(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    CacheEvent::BackendError { .. } | CacheEvent::DecodeError { .. }
                )
            })
            .count()
    }
}

impl CacheEventSink for RecordingSink {
    fn record(&self, event: CacheEvent) {
        self.events.lock().expect("event sink poisoned").push(event);
    }
}
