//! Observable value stores
//!
//! A `Store<T>` holds one value with `get / set / subscribe`. State that the
//! dashboard shares between workflows (session, upload history) lives behind
//! this trait so workflows can be tested against a `MemoryStore` while the
//! binary persists through a `JsonFileStore`.

use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Single-value store with change notification
pub trait Store<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// Snapshot of the current value
    fn get(&self) -> T;

    /// Replace the value; last writer wins
    fn set(&self, value: T) -> Result<()>;

    /// Receiver that observes every subsequent `set`
    fn subscribe(&self) -> watch::Receiver<T>;
}

/// In-memory store backed by a tokio watch channel
pub struct MemoryStore<T> {
    tx: watch::Sender<T>,
}

impl<T> MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }
}

impl<T> Default for MemoryStore<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    fn set(&self, value: T) -> Result<()> {
        // send_replace succeeds even when nobody is subscribed
        self.tx.send_replace(value);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

/// Store persisted as pretty JSON on every `set`
///
/// The file stands in for the browser's local storage: it is read once on
/// open and rewritten (temp file + rename) on each change.
pub struct JsonFileStore<T> {
    path: PathBuf,
    inner: MemoryStore<T>,
}

impl<T> JsonFileStore<T>
where
    T: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Open the store, starting from `T::default()` when the file is missing
    /// or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<T>(&content) {
                Ok(value) => {
                    debug!("Loaded store from {}", path.display());
                    value
                }
                Err(e) => {
                    warn!(
                        "Ignoring corrupt store file {}: {}",
                        path.display(),
                        e
                    );
                    T::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
            Err(e) => {
                warn!("Could not read store file {}: {}", path.display(), e);
                T::default()
            }
        };

        Self {
            path,
            inner: MemoryStore::new(initial),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl<T> Store<T> for JsonFileStore<T>
where
    T: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn get(&self) -> T {
        self.inner.get()
    }

    fn set(&self, value: T) -> Result<()> {
        self.persist(&value)?;
        self.inner.set(value)
    }

    fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.subscribe()
    }
}
