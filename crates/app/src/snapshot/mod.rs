//! Local cart snapshots
//!
//! A snapshot paints the cart on cold start before the first authoritative reload returns. It
//! is never treated as authoritative and is overwritten by every successful reload.

use mockall::automock;
use trolley::{identity::SessionKey, lines::CartLine};

pub mod errors;
pub mod file;
pub mod memory;

pub use errors::SnapshotError;
pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

/// Key-value scratch storage for the last known cart of each session.
#[automock]
pub trait SnapshotStore: Send + Sync {
    /// Store `lines` as the latest snapshot for `key`.
    fn save(&self, key: SessionKey, lines: &[CartLine]) -> Result<(), SnapshotError>;

    /// Load the latest snapshot for `key`, if one exists.
    fn load(&self, key: SessionKey) -> Result<Option<Vec<CartLine>>, SnapshotError>;

    /// Forget the snapshot for `key`.
    fn clear(&self, key: SessionKey) -> Result<(), SnapshotError>;
}
