//! Per-path reader/writer locks.
//!
//! A lock is created the first time a path is touched and dropped from the
//! table as soon as nobody holds or waits on it, so the table only ever
//! contains paths with operations in flight.
//!
//! Paths are keyed after lexical normalisation, so `/r//a`, `/r/./a` and
//! `/r/b/../a` all share one lock.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

#[derive(Debug, Default)]
pub struct PathLocks {
    table: Mutex<HashMap<PathBuf, Arc<RwLock<()>>>>,
}

/// Kept only so the guard is released on drop.
enum Held {
    Read { _guard: OwnedRwLockReadGuard<()> },
    Write { _guard: OwnedRwLockWriteGuard<()> },
}

/// Holds a path lock; releasing it prunes the table entry when unused.
pub struct PathGuard<'a> {
    locks: &'a PathLocks,
    path: PathBuf,
    held: Option<Held>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access: any number of readers, no writer.
    pub async fn read(&self, path: &Path) -> PathGuard<'_> {
        let key = lock_key(path);
        let lock = self.entry(&key);
        let guard = lock.read_owned().await;
        PathGuard {
            locks: self,
            path: key,
            held: Some(Held::Read { _guard: guard }),
        }
    }

    /// Exclusive access.
    pub async fn write(&self, path: &Path) -> PathGuard<'_> {
        let key = lock_key(path);
        let lock = self.entry(&key);
        let guard = lock.write_owned().await;
        PathGuard {
            locks: self,
            path: key,
            held: Some(Held::Write { _guard: guard }),
        }
    }

    /// Number of paths currently tracked.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, key: &Path) -> Arc<RwLock<()>> {
        Arc::clone(self.table().entry(key.to_path_buf()).or_default())
    }

    fn release(&self, key: &Path) {
        let mut table = self.table();
        // Only the table's own reference left: no holder, no waiter.
        if table.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            table.remove(key);
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<RwLock<()>>>> {
        // The critical sections never panic midway, so a poisoned table is still consistent.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lexical normal form of `path`: repeated separators and `.` vanish, and
/// `..` cancels the segment before it. The filesystem is never consulted.
fn lock_key(path: &Path) -> PathBuf {
    let mut key = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir
                if matches!(key.components().next_back(), Some(Component::Normal(_))) =>
            {
                key.pop();
            }
            other => key.push(other),
        }
    }
    key
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.held.take();
        self.locks.release(&self.path);
    }
}
