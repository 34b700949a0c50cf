//! Advisory per-project lock.
//!
//! A sync holds an exclusive lock on `<project>/engineering-team.db.lock`
//! from `load()` to `commit()`, so two invocations against the same
//! project serialize. Acquisition polls for a bounded time and then fails
//! with [`LedgerError::Locked`] instead of blocking forever.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fd_lock::{RwLock, RwLockWriteGuard};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};

/// Lock file name, next to the ledger database.
pub const LOCK_FILE_NAME: &str = "engineering-team.db.lock";

/// Default bound on the lock wait.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2_000);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handle on a project's lock file. Call [`LedgerLock::acquire`] to lock it.
pub struct LedgerLock {
    path: PathBuf,
    inner: RwLock<File>,
}

/// Held lock; released on drop.
pub struct LedgerLockGuard<'a> {
    _guard: RwLockWriteGuard<'a, File>,
}

impl LedgerLock {
    /// Open (or create) the lock file for `project_root`.
    pub fn open(project_root: &Path) -> LedgerResult<Self> {
        let path = project_root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;
        Ok(Self {
            path,
            inner: RwLock::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the exclusive lock, waiting at most `timeout`.
    pub fn acquire(&mut self, timeout: Duration) -> LedgerResult<LedgerLockGuard<'_>> {
        let deadline = Instant::now() + timeout;
        while !self.is_free()? {
            if Instant::now() >= deadline {
                return Err(LedgerError::Locked {
                    path: self.path.clone(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        match self.inner.try_write() {
            Ok(guard) => {
                debug!(path = %self.path.display(), "project lock acquired");
                Ok(LedgerLockGuard { _guard: guard })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(LedgerError::Locked {
                path: self.path.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Probe the lock without keeping it.
    fn is_free(&mut self) -> LedgerResult<bool> {
        match self.inner.try_write() {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
