// src/services/file_lock.rs
//! Cooperative per-file lock built on `create_dir`, which is atomic on every
//! platform we run on. Only safe within a single process: a forced removal of
//! an "abandoned" lock can let two processes interleave writes.

use crate::error::{DataError, Result};
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct LockOptions {
    pub retry_interval: Duration,
    /// How long a held lock is tolerated before it is treated as abandoned.
    pub max_wait: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        LockOptions {
            retry_interval: Duration::from_millis(50),
            max_wait: Duration::from_secs(5),
        }
    }
}

/// Held lock. The lock directory is removed on drop.
#[derive(Debug)]
pub struct FileLockGuard {
    lock_path: PathBuf,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir(&self.lock_path) {
            debug!("Failed to release lock {:?}: {}", self.lock_path, e);
        }
    }
}

pub fn lock_path_for(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Acquires the lock guarding `file`, waiting up to `options.max_wait`.
///
/// A lock still held after that is force-removed and acquisition retried.
/// If the lock cannot be taken within a further `max_wait` window the call
/// fails with `LockTimeout`.
pub async fn acquire(file: &Path, options: LockOptions) -> Result<FileLockGuard> {
    let lock_path = lock_path_for(file);
    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut started = Instant::now();
    let mut forced = false;

    loop {
        match std::fs::create_dir(&lock_path) {
            Ok(()) => {
                debug!("Acquired lock {:?}", lock_path);
                return Ok(FileLockGuard { lock_path });
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if started.elapsed() <= options.max_wait {
                    tokio::time::sleep(options.retry_interval).await;
                    continue;
                }
                if forced {
                    return Err(DataError::LockTimeout(lock_path));
                }
                warn!(
                    "Lock {:?} held for more than {:?}, removing it as abandoned",
                    lock_path, options.max_wait
                );
                if let Err(e) = std::fs::remove_dir(&lock_path) {
                    debug!("Could not remove abandoned lock {:?}: {}", lock_path, e);
                }
                forced = true;
                started = Instant::now();
            }
            Err(e) => return Err(e.into()),
        }
    }
}
