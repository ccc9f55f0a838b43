//! Snapshot store errors.

use thiserror::Error;

/// Errors raised while reading, writing or removing a cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot file could not be read, written or removed.
    #[error("snapshot storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot contents are not valid snapshot JSON.
    #[error("snapshot could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),
}
