//! File-backed snapshot store.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trolley::{identity::SessionKey, lines::CartLine};

use super::{SnapshotError, SnapshotStore};

/// Stores one JSON document per session in a directory, so the cart survives restarts.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let dir = dir.into();

        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    /// The directory snapshots are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: SessionKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    saved_at: Timestamp,
    lines: Vec<CartLine>,
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, key: SessionKey, lines: &[CartLine]) -> Result<(), SnapshotError> {
        let document = SnapshotDocument {
            saved_at: Timestamp::now(),
            lines: lines.to_vec(),
        };

        let path = self.path(key);
        let staging = path.with_extension("json.tmp");

        fs::write(&staging, serde_json::to_vec(&document)?)?;
        fs::rename(&staging, &path)?;

        debug!(%key, lines = lines.len(), "saved cart snapshot");

        Ok(())
    }

    fn load(&self, key: SessionKey) -> Result<Option<Vec<CartLine>>, SnapshotError> {
        let bytes = match fs::read(self.path(key)) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        let document: SnapshotDocument = serde_json::from_slice(&bytes)?;

        debug!(%key, saved_at = %document.saved_at, "loaded cart snapshot");

        Ok(Some(document.lines))
    }

    fn clear(&self, key: SessionKey) -> Result<(), SnapshotError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
