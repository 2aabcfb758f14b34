//! Local cart snapshot storage.

use crate::model::CartLine;
use crate::services::{CacheError, CartCache};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Stores the snapshot as a JSON file.
///
/// Writes go to a sibling temp file that is then renamed over the target, so a
/// crash mid-write never leaves a truncated snapshot behind.
///
/// All three operations do blocking `std::fs` I/O on the calling thread. The
/// synchronizer calls them from its actor task, so keep the file on local disk;
/// the snapshot is a few lines of JSON.
#[derive(Debug, Clone)]
pub struct FileCartCache {
    path: PathBuf,
}

impl FileCartCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartCache for FileCartCache {
    fn load(&self) -> Result<Option<Vec<CartLine>>, CacheError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, lines: &[CartLine]) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(lines)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), lines = lines.len(), "Cart snapshot stored");
        Ok(())
    }

    fn remove(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cart snapshot removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the snapshot in memory. Used when no cache path is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryCartCache {
    lines: Mutex<Option<Vec<CartLine>>>,
}

impl MemoryCartCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartCache for MemoryCartCache {
    fn load(&self) -> Result<Option<Vec<CartLine>>, CacheError> {
        Ok(self
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, lines: &[CartLine]) -> Result<(), CacheError> {
        *self.lines.lock().unwrap_or_else(PoisonError::into_inner) = Some(lines.to_vec());
        Ok(())
    }

    fn remove(&self) -> Result<(), CacheError> {
        *self.lines.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
