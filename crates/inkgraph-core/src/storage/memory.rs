//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Keeps snapshot text in memory. Loads decode a fresh project each time, so
/// edits made after a save never leak into the stored copy.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.read().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Other("memory storage lock poisoned".to_string())
}

impl Storage for MemoryStorage {
    fn write(&self, id: &str, json: String) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.snapshots.write().map_err(poisoned)?.insert(id, json);
            Ok(())
        })
    }

    fn read(&self, id: &str) -> BoxFuture<'_, StorageResult<String>> {
        let id = id.to_string();
        Box::pin(async move {
            let snapshots = self.snapshots.read().map_err(poisoned)?;
            snapshots.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }
}
