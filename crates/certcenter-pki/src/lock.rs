//! Process-wide exclusive lock guarding every CA-touching operation.
//!
//! Two layers: an async mutex serializes tasks sharing one [`CaLock`], and an
//! advisory `flock` on a fixed path serializes everything else that opens the
//! same file (other `CaLock` instances, other processes). Acquisition blocks
//! without timeout. The lock is released when the guard is dropped, on every
//! exit path.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::PkiError;

#[derive(Debug)]
pub struct CaLock {
    path: PathBuf,
    local: Arc<Mutex<()>>,
}

/// Held for the duration of one lifecycle operation.
#[derive(Debug)]
pub struct CaLockGuard {
    file: File,
    _local: OwnedMutexGuard<()>,
}

impl CaLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            local: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn acquire(&self) -> Result<CaLockGuard, PkiError> {
        let local = Arc::clone(&self.local).lock_owned().await;

        let path = self.path.clone();
        let file = tokio::task::spawn_blocking(move || lock_file(&path))
            .await
            .map_err(|e| PkiError::Lock(format!("lock task failed: {e}")))?
            .map_err(|e| PkiError::Lock(format!("{}: {e}", self.path.display())))?;

        tracing::trace!(path = %self.path.display(), "CA lock acquired");
        Ok(CaLockGuard {
            file,
            _local: local,
        })
    }
}

fn lock_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    file.lock()?;
    Ok(file)
}

impl Drop for CaLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(error = %e, "Failed to release CA lock");
        }
    }
}
