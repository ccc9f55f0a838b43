//! In-memory snapshot store.

use std::sync::{Mutex, PoisonError};

use rustc_hash::FxHashMap;
use trolley::{identity::SessionKey, lines::CartLine};

use super::{SnapshotError, SnapshotStore};

/// Snapshot store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<FxHashMap<SessionKey, Vec<CartLine>>>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, key: SessionKey, lines: &[CartLine]) -> Result<(), SnapshotError> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, lines.to_vec());

        Ok(())
    }

    fn load(&self, key: SessionKey) -> Result<Option<Vec<CartLine>>, SnapshotError> {
        Ok(self
            .snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned())
    }

    fn clear(&self, key: SessionKey) -> Result<(), SnapshotError> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);

        Ok(())
    }
}
