//! Checkpoint contract (spec §4.7, §6): "a source or processor may
//! persist a position marker (offset, cursor, watermark) so restart can
//! resume rather than replay from the beginning. `Save(path, data)`,
//! `Load(path) -> data`. The format of `data` is owned by the caller;
//! the checkpoint store treats it as an opaque blob."

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// An opaque checkpoint payload. Callers (sources, the realtime
/// dedup/upsert layer) serialize their own position marker into this —
/// the store never inspects it.
pub type CheckpointData = Vec<u8>;

/// Errors a [`Checkpointer`] implementation can return.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// No checkpoint has been saved at this path yet.
    #[error("no checkpoint at path: {0}")]
    NotFound(String),
    /// Any other store-specific failure (disk I/O, network, encoding).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Durable position storage for restart recovery.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persists `data` under `path`, replacing whatever was there.
    async fn save(&self, path: &str, data: CheckpointData) -> Result<(), CheckpointError>;

    /// Loads the checkpoint previously saved under `path`.
    async fn load(&self, path: &str) -> Result<CheckpointData, CheckpointError>;
}

/// An in-memory [`Checkpointer`] that keeps data only for the life of the
/// process. Used where no durable store is configured and by tests;
/// equivalent to "no checkpointing" across restarts but still lets a
/// running pipeline exercise save/load round trips.
#[derive(Debug, Default)]
pub struct NullCheckpointer {
    entries: DashMap<String, CheckpointData>,
}

impl NullCheckpointer {
    /// Builds an empty in-memory checkpoint store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Snapshots all currently stored checkpoints (for diagnostics/tests).
    pub fn snapshot(&self) -> HashMap<String, CheckpointData> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[async_trait]
impl Checkpointer for NullCheckpointer {
    async fn save(&self, path: &str, data: CheckpointData) -> Result<(), CheckpointError> {
        self.entries.insert(path.to_string(), data);
        Ok(())
    }

    async fn load(&self, path: &str) -> Result<CheckpointData, CheckpointError> {
        self.entries
            .get(path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CheckpointError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = NullCheckpointer::new();
        store.save("source-a", vec![1, 2, 3]).await.unwrap();
        let loaded = store.load("source-a").await.unwrap();
        assert_eq!(loaded, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn loading_unknown_path_reports_not_found() {
        let store = NullCheckpointer::new();
        let result = store.load("never-saved").await;
        assert!(matches!(result, Err(CheckpointError::NotFound(_))));
    }

    #[tokio::test]
    async fn save_overwrites_prior_value() {
        let store = NullCheckpointer::new();
        store.save("source-a", vec![1]).await.unwrap();
        store.save("source-a", vec![2]).await.unwrap();
        assert_eq!(store.load("source-a").await.unwrap(), vec![2]);
    }
}
