//! Deduplication contract (spec §4.7): "Abstract contract: `IsDuplicate(eventID)
//! → bool`, `MarkProcessed(eventID)`, `EntityExists(entityID)`,
//! `SetEntityExists(entityID)`, `DeleteEntity(entityID)`, `Close()`. The
//! core specifies two conforming implementations: an in-process
//! implementation with a TTL-pruned mapping, and a remote implementation
//! that delegates to an external key-value store."

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// Layer 3: Internal module imports
// (none)

/// Errors a [`Dedup`] implementation's fallible operations can return.
/// `IsDuplicate`/`EntityExists` are infallible by contract (spec §4.7
/// gives them a bare `bool` signature); a backing store failure there is
/// treated as "not a duplicate"/"does not exist" and logged, rather than
/// surfaced here.
#[derive(Debug, Error)]
pub enum DedupError {
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The deduplication/entity-existence contract shared by every conforming
/// implementation.
#[async_trait]
pub trait Dedup: Send + Sync {
    /// True iff some earlier [`mark_processed`](Dedup::mark_processed)
    /// call for `event_id` occurred within the TTL window.
    async fn is_duplicate(&self, event_id: &str) -> bool;

    /// Records that `event_id` has been processed, starting its TTL.
    async fn mark_processed(&self, event_id: &str) -> Result<(), DedupError>;

    /// True iff `entity_id` has been marked present via
    /// [`set_entity_exists`](Dedup::set_entity_exists) and not since
    /// deleted. Entity entries are never TTL-pruned.
    async fn entity_exists(&self, entity_id: &str) -> bool;

    /// Marks `entity_id` as present.
    async fn set_entity_exists(&self, entity_id: &str) -> Result<(), DedupError>;

    /// Removes `entity_id` from the present set.
    async fn delete_entity(&self, entity_id: &str) -> Result<(), DedupError>;

    /// Releases any held resources (e.g. the in-process implementation's
    /// background pruning task).
    async fn close(&self);
}

/// An in-process [`Dedup`] with a TTL-pruned event mapping and a
/// non-expiring entity-existence set.
///
/// "Invariants of the in-process implementation: a background pruning
/// task runs at a fixed interval (1 minute) and removes event entries
/// older than TTL; entity entries are not TTL-pruned — only explicit
/// deletes remove them." (spec §4.7)
pub struct InMemoryDedup {
    events: Arc<DashMap<String, DateTime<Utc>>>,
    entities: Arc<DashMap<String, ()>>,
    ttl: ChronoDuration,
    cancellation: CancellationToken,
    pruning_task: Mutex<Option<JoinHandle<()>>>,
}

/// The background pruning task's fixed interval (spec §4.7).
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

impl InMemoryDedup {
    /// Builds a store with the given TTL, immediately spawning its
    /// background pruning task.
    pub fn new(ttl: Duration) -> Self {
        let events: Arc<DashMap<String, DateTime<Utc>>> = Arc::new(DashMap::new());
        let ttl_chrono = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::zero());
        let cancellation = CancellationToken::new();

        let pruning_events = Arc::clone(&events);
        let prune_token = cancellation.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(PRUNE_INTERVAL);
            loop {
                tokio::select! {
                    _ = prune_token.cancelled() => break,
                    _ = interval.tick() => {
                        let now = Utc::now();
                        pruning_events.retain(|_, marked_at| now.signed_duration_since(*marked_at) < ttl_chrono);
                    }
                }
            }
        });

        Self {
            events,
            entities: Arc::new(DashMap::new()),
            ttl: ttl_chrono,
            cancellation,
            pruning_task: Mutex::new(Some(handle)),
        }
    }
}

#[async_trait]
impl Dedup for InMemoryDedup {
    async fn is_duplicate(&self, event_id: &str) -> bool {
        match self.events.get(event_id) {
            Some(marked_at) => Utc::now().signed_duration_since(*marked_at) < self.ttl,
            None => false,
        }
    }

    async fn mark_processed(&self, event_id: &str) -> Result<(), DedupError> {
        self.events.insert(event_id.to_string(), Utc::now());
        Ok(())
    }

    async fn entity_exists(&self, entity_id: &str) -> bool {
        self.entities.contains_key(entity_id)
    }

    async fn set_entity_exists(&self, entity_id: &str) -> Result<(), DedupError> {
        self.entities.insert(entity_id.to_string(), ());
        Ok(())
    }

    async fn delete_entity(&self, entity_id: &str) -> Result<(), DedupError> {
        self.entities.remove(entity_id);
        Ok(())
    }

    async fn close(&self) {
        self.cancellation.cancel();
        if let Some(handle) = self.pruning_task.lock().take() {
            let _ = handle.await;
        }
    }
}

/// A key-value backend an external store adapter implements, so
/// [`RemoteDedup`] can delegate to it without depending on any one
/// backend's client library (spec §1 scopes per-backend I/O glue out).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the raw value stored at `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    /// Stores `value` at `key`, expiring after `ttl` if given.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), anyhow::Error>;
    /// Removes `key`.
    async fn delete(&self, key: &str) -> Result<(), anyhow::Error>;
}

const EVENT_KEY_PREFIX: &str = "dedup:event:";
const ENTITY_KEY_PREFIX: &str = "dedup:entity:";

/// A [`Dedup`] implementation delegating to an external key-value store
/// (spec §4.7: "a remote implementation that delegates to an external
/// key-value store").
pub struct RemoteDedup<S: RemoteStore> {
    store: S,
    ttl: Duration,
}

impl<S: RemoteStore> RemoteDedup<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }
}

#[async_trait]
impl<S: RemoteStore> Dedup for RemoteDedup<S> {
    async fn is_duplicate(&self, event_id: &str) -> bool {
        match self.store.get(&format!("{EVENT_KEY_PREFIX}{event_id}")).await {
            Ok(value) => value.is_some(),
            Err(error) => {
                tracing::warn!(%error, event_id, "remote dedup lookup failed; treating as not a duplicate");
                false
            }
        }
    }

    async fn mark_processed(&self, event_id: &str) -> Result<(), DedupError> {
        self.store
            .set(&format!("{EVENT_KEY_PREFIX}{event_id}"), "1", Some(self.ttl))
            .await
            .map_err(DedupError::from)
    }

    async fn entity_exists(&self, entity_id: &str) -> bool {
        match self.store.get(&format!("{ENTITY_KEY_PREFIX}{entity_id}")).await {
            Ok(value) => value.is_some(),
            Err(error) => {
                tracing::warn!(%error, entity_id, "remote dedup lookup failed; treating entity as absent");
                false
            }
        }
    }

    async fn set_entity_exists(&self, entity_id: &str) -> Result<(), DedupError> {
        self.store
            .set(&format!("{ENTITY_KEY_PREFIX}{entity_id}"), "1", None)
            .await
            .map_err(DedupError::from)
    }

    async fn delete_entity(&self, entity_id: &str) -> Result<(), DedupError> {
        self.store
            .delete(&format!("{ENTITY_KEY_PREFIX}{entity_id}"))
            .await
            .map_err(DedupError::from)
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mark_processed_then_is_duplicate_within_ttl() {
        let dedup = InMemoryDedup::new(Duration::from_secs(3600));
        assert!(!dedup.is_duplicate("evt-1").await);
        dedup.mark_processed("evt-1").await.unwrap();
        assert!(dedup.is_duplicate("evt-1").await);
        dedup.close().await;
    }

    #[tokio::test]
    async fn dedup_ttl_expiry_leaves_no_state_leak() {
        // Spec §8 boundary scenario 1, with a TTL short enough to observe
        // expiry without a real 1-hour wait.
        let dedup = InMemoryDedup::new(Duration::from_millis(20));
        dedup.mark_processed("evt-2").await.unwrap();
        assert!(dedup.is_duplicate("evt-2").await);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!dedup.is_duplicate("evt-2").await);
        dedup.close().await;
    }

    #[tokio::test]
    async fn entity_existence_is_not_ttl_pruned() {
        let dedup = InMemoryDedup::new(Duration::from_millis(1));
        dedup.set_entity_exists("e1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(dedup.entity_exists("e1").await);
        dedup.delete_entity("e1").await.unwrap();
        assert!(!dedup.entity_exists("e1").await);
        dedup.close().await;
    }

    struct FakeStore {
        values: dashmap::DashMap<String, String>,
    }

    #[async_trait]
    impl RemoteStore for FakeStore {
        async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
            Ok(self.values.get(key).map(|v| v.clone()))
        }
        async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> Result<(), anyhow::Error> {
            self.values.insert(key.to_string(), value.to_string());
            Ok(())
        }
        async fn delete(&self, key: &str) -> Result<(), anyhow::Error> {
            self.values.remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn remote_dedup_delegates_to_the_backing_store() {
        let dedup = RemoteDedup::new(
            FakeStore {
                values: dashmap::DashMap::new(),
            },
            Duration::from_secs(60),
        );
        assert!(!dedup.is_duplicate("evt-3").await);
        dedup.mark_processed("evt-3").await.unwrap();
        assert!(dedup.is_duplicate("evt-3").await);
        dedup.close().await;
    }
}
