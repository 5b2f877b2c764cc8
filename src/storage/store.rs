//! Key-value backends for persisted state.
//!
//! A [`KeyValueStore`] holds string values under string keys, the same shape
//! as browser local storage. The board keeps its whole collection under a
//! single key, and rewrites it through [`KeyValueStore::update`] so that the
//! check of the stored revision and the write happen as one step.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::PathBuf,
};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use fslock::LockFile;

/// String values stored under string keys.
pub trait KeyValueStore {
    /// Read the value under `key`, or `None` if nothing is stored there.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written, or the value does
    /// not fit.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read the value under `key`, pass it to `f`, and write back what `f`
    /// returns.
    ///
    /// No other writer to the same store can change the value between the
    /// read and the write. If `f` fails, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or a [`StoreError`] if the backend cannot
    /// be locked, read or written.
    fn update<E, F>(&mut self, key: &str, f: F) -> Result<(), E>
    where
        E: From<StoreError>,
        F: FnOnce(Option<String>) -> Result<String, E>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn update<E, F>(&mut self, key: &str, f: F) -> Result<(), E>
    where
        E: From<StoreError>,
        F: FnOnce(Option<String>) -> Result<String, E>,
    {
        (**self).update(key, f)
    }
}

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// The value is larger than the store accepts.
    #[error("storage quota exceeded: {needed} bytes needed, {quota} available")]
    QuotaExceeded {
        /// Bytes the store would hold after the write.
        needed: usize,
        /// Bytes the store accepts.
        quota: usize,
    },
}

/// A store that keeps each key in its own JSON file under a directory.
///
/// Writes go to a temporary file that is renamed into place, so readers
/// never observe a half-written value. Writers take an exclusive lock on
/// `<key>.lock` first, which serializes them across processes.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at the given directory.
    ///
    /// The directory is created on the first write.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Block until this process holds the write lock for `key`.
    ///
    /// The lock is released when the returned handle is dropped.
    fn lock(&self, key: &str) -> Result<LockFile, StoreError> {
        fs::create_dir_all(&self.root)?;
        let mut lock = LockFile::open(&self.root.join(format!("{key}.lock")))?;
        lock.lock()?;
        tracing::trace!("Locked {key} in {}", self.root.display());
        Ok(lock)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);

        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                f.write_all(value.as_bytes())?;
                f.flush()
            })
            .map_err(|err| match err {
                atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => e,
            })?;

        tracing::debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No stored value at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let _lock = self.lock(key)?;
        self.write(key, value)
    }

    fn update<E, F>(&mut self, key: &str, f: F) -> Result<(), E>
    where
        E: From<StoreError>,
        F: FnOnce(Option<String>) -> Result<String, E>,
    {
        let _lock = self.lock(key)?;
        let value = f(self.get(key)?)?;
        self.write(key, &value)?;
        Ok(())
    }
}

/// An in-memory store, with an optional size limit.
///
/// The limit counts the bytes of every key and value held, like the quota
/// a browser enforces on local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// An empty, unlimited store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store that holds at most `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: HashMap::new(),
            quota: Some(quota),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }

        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update<E, F>(&mut self, key: &str, f: F) -> Result<(), E>
    where
        E: From<StoreError>,
        F: FnOnce(Option<String>) -> Result<String, E>,
    {
        let value = f(self.values.get(key).cloned())?;
        self.set(key, &value)?;
        Ok(())
    }
}
