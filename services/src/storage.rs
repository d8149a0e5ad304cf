//! File persistence helpers shared by the workspace services.
//!
//! Writes to the same path are serialised through a per-path async lock, and every write goes
//! through a `.tmp` sibling that is renamed into place, so readers never observe a half-written
//! file. The previous content is kept as a `.bak` sibling.

use crate::error::{ServiceError, ServiceResult};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::warn;
use util::paths::join_relative;

type LockMap = HashMap<PathBuf, Arc<AsyncMutex<()>>>;

static FILE_LOCKS: Lazy<Mutex<LockMap>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn file_locks() -> std::sync::MutexGuard<'static, LockMap> {
    FILE_LOCKS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Exclusive hold on one path. The lock entry is dropped from the map once nobody else holds or
/// waits for it.
pub struct PathGuard {
    path: PathBuf,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = file_locks();
        let unused = locks
            .get(&self.path)
            .is_some_and(|held| Arc::ptr_eq(held, &self.lock) && Arc::strong_count(held) == 2);
        if unused {
            locks.remove(&self.path);
        }
    }
}

/// Acquires the write lock for `path`.
pub async fn lock_path(path: &Path) -> PathGuard {
    let lock = file_locks()
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone();
    let guard = lock.clone().lock_owned().await;
    PathGuard {
        path: path.to_path_buf(),
        lock,
        guard: Some(guard),
    }
}

/// Location of a stored file below `base`. Names that would leave `base` are a
/// [`ServiceError::BadRequest`].
pub fn stored_path(base: &Path, relative: &str) -> ServiceResult<PathBuf> {
    join_relative(base, relative).map_err(|_| {
        ServiceError::BadRequest(format!("stored path leaves the workspace: {relative}"))
    })
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// `true` for the intermediate files [`atomic_write`] leaves next to its targets.
pub fn is_scratch_file(name: &str) -> bool {
    name.ends_with(".tmp") || name.ends_with(".bak")
}

/// Writes `bytes` to `path` via a temporary sibling, creating parent directories as needed.
pub async fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let _guard = lock_path(path).await;
    replace_file(path, bytes).await
}

/// [`atomic_write`] for callers that already hold [`lock_path`] for `path`.
pub async fn replace_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    if fs::try_exists(path).await.unwrap_or(false) {
        if let Err(e) = fs::copy(path, with_suffix(path, ".bak")).await {
            warn!("Could not back up {}: {e}", path.display());
        }
    }
    let tmp = with_suffix(path, ".tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await
}

/// Pretty-printed JSON variant of [`atomic_write`].
pub async fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
    atomic_write(path, &json).await
}
