use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use depot_domain::RepoPath;
use fs4::FileExt;
use tracing::trace;

use crate::error::StorageError;

/// Serializes deployments per snapshot version directory, both between
/// threads of this process and between processes sharing the storage.
#[derive(Default)]
pub(crate) struct DirectoryLocks {
    held: Mutex<HashMap<RepoPath, Arc<Mutex<()>>>>,
}

impl DirectoryLocks {
    /// Runs `critical` while holding the in-process mutex for `directory`
    /// and an exclusive lock on `lock_file`.
    pub(crate) fn with_directory<T, E>(
        &self,
        directory: &RepoPath,
        lock_file: &Path,
        critical: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let mutex = self.mutex_for(directory);
        let result = Self::locked(&mutex, directory, lock_file, critical);
        self.release(directory, &mutex);
        result
    }

    fn locked<T, E>(
        mutex: &Mutex<()>,
        directory: &RepoPath,
        lock_file: &Path,
        critical: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let _guard = mutex.lock().unwrap_or_else(PoisonError::into_inner);

        let unavailable = |err: std::io::Error| {
            StorageError::unavailable(directory.repo_key(), directory.path(), err)
        };
        if let Some(parent) = lock_file.parent() {
            fs::create_dir_all(parent).map_err(unavailable)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_file)
            .map_err(unavailable)?;
        file.lock_exclusive().map_err(unavailable)?;
        trace!(dir = %directory, "deploy lock acquired");

        let result = critical();
        drop(file);
        result
    }

    fn mutex_for(&self, directory: &RepoPath) -> Arc<Mutex<()>> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(held.entry(directory.clone()).or_default())
    }

    /// Drops the directory's entry once no other caller holds or awaits it.
    fn release(&self, directory: &RepoPath, mutex: &Arc<Mutex<()>>) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        // one reference in the map, one here
        let idle = held.get(directory).is_some_and(|tracked| {
            Arc::ptr_eq(tracked, mutex) && Arc::strong_count(mutex) == 2
        });
        if idle {
            held.remove(directory);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.held.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
