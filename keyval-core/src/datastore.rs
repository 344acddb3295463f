use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cleanup::{CleanupTask, Sweeper};
use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::entry::Entry;
use crate::error::{Result, StoreError};
use crate::persist;
use crate::store::Store;
use crate::validate::{validate_key, validate_value};

/// Truncates a key for logging
fn truncate_key_for_log(key: &str) -> String {
    const MAX_LOG_LEN: usize = 16;
    if key.chars().count() <= MAX_LOG_LEN {
        key.to_string()
    } else {
        let head: String = key.chars().take(MAX_LOG_LEN).collect();
        format!("{}...", head)
    }
}

/// Internal shared state for the data store
struct Inner {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    /// Guards the map and every write of the storage file
    store: Mutex<Store>,
    cleanup: Mutex<Option<CleanupTask>>,
}

impl Inner {
    fn persist(&self, store: &Store) -> Result<()> {
        persist::save(store, &self.config.path, self.config.max_file_bytes)?;
        Ok(())
    }

    /// Fails unless `key` is present and unexpired. An expired entry is
    /// evicted and the store persisted before `KeyExpired` is returned.
    fn ensure_live(&self, store: &mut Store, key: &str) -> Result<()> {
        let entry = store
            .get(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;

        if entry.is_expired(self.clock.now_millis()) {
            store.remove(key);
            tracing::debug!("EXPIRED {}", truncate_key_for_log(key));
            self.persist(store)?;
            return Err(StoreError::KeyExpired(key.to_string()));
        }
        Ok(())
    }
}

impl Sweeper for Inner {
    fn sweep_and_persist(&self) -> Result<usize> {
        let mut store = self.store.lock();
        let removed = store.sweep_expired(self.clock.now_millis());
        self.persist(&store)?;
        Ok(removed)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Signal the cleanup task to stop when the last handle is dropped
        if let Some(task) = self.cleanup.get_mut().take() {
            task.stop();
        }
    }
}

/// File-backed key-value store with per-entry TTL.
///
/// Every operation takes one exclusive lock for its whole body: validation,
/// the map mutation, and the rewrite of the storage file. Operations are
/// therefore totally ordered, and the file always holds a snapshot taken
/// between two operations.
///
/// Expired entries are removed lazily when `read` or `delete` touches them,
/// and in bulk by the optional background cleanup task.
///
/// Cloning is cheap; clones share the same store.
///
/// # Example
///
/// ```rust,no_run
/// use keyval_core::{KeyValueDataStore, StoreConfig};
/// use serde_json::json;
///
/// # fn main() -> keyval_core::Result<()> {
/// let store = KeyValueDataStore::open(StoreConfig::new("/tmp/kv_store.json"))?;
///
/// store.create("session1", json!({"user": "alice"}), 5)?;
/// assert_eq!(store.read("session1")?, json!({"user": "alice"}));
/// store.delete("session1")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct KeyValueDataStore {
    inner: Arc<Inner>,
}

impl KeyValueDataStore {
    /// Opens the store described by `config`, loading any existing file.
    ///
    /// Entries that already expired are not loaded. A storage file that does
    /// not parse is logged and treated as empty; it is overwritten by the
    /// next successful persist.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Opens the store using `clock` for every expiry decision
    pub fn open_with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let entries = persist::load(&config.path, clock.now_millis())?;

        let inner = Arc::new(Inner {
            config,
            clock,
            store: Mutex::new(Store::from(entries)),
            cleanup: Mutex::new(None),
        });
        Ok(Self { inner })
    }

    /// Stores `value` under a new `key`.
    ///
    /// A `ttl_seconds` of zero or less means the entry never expires.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidKey`] / [`StoreError::ValueTooLarge`] if a limit is exceeded
    /// - [`StoreError::KeyExists`] if `key` is present, even when that entry
    ///   has expired but not yet been evicted
    /// - [`StoreError::PersistenceFailed`] if the file could not be written.
    ///   The entry stays in memory.
    pub fn create(&self, key: &str, value: Value, ttl_seconds: i64) -> Result<()> {
        let mut store = self.inner.store.lock();

        validate_key(key, self.inner.config.max_key_length)?;
        validate_value(&value, self.inner.config.max_value_bytes)?;

        if store.contains_key(key) {
            return Err(StoreError::KeyExists(key.to_string()));
        }

        let ttl_display = if ttl_seconds > 0 {
            format!("{}s", ttl_seconds)
        } else {
            "never".to_string()
        };
        tracing::debug!("CREATE {} (ttl: {})", truncate_key_for_log(key), ttl_display);

        let entry = Entry::with_ttl(value, ttl_seconds, self.inner.clock.now_millis());
        store.put(key, entry);
        self.inner.persist(&store)
    }

    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::KeyNotFound`] if `key` is absent
    /// - [`StoreError::KeyExpired`] if the entry has expired. It is evicted and
    ///   the file rewritten, so the next call reports `KeyNotFound`.
    /// - [`StoreError::PersistenceFailed`] if that eviction could not be persisted
    pub fn read(&self, key: &str) -> Result<Value> {
        let mut store = self.inner.store.lock();
        tracing::debug!("READ {}", truncate_key_for_log(key));

        self.inner.ensure_live(&mut store, key)?;
        store
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read): an expired entry is still removed, but the
    /// call reports [`StoreError::KeyExpired`].
    pub fn delete(&self, key: &str) -> Result<()> {
        let mut store = self.inner.store.lock();
        tracing::debug!("DELETE {}", truncate_key_for_log(key));

        self.inner.ensure_live(&mut store, key)?;
        store.remove(key);
        self.inner.persist(&store)
    }

    /// Serializes `value` and stores it with [`create`](Self::create)
    pub fn create_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: i64,
    ) -> Result<()> {
        let value = serde_json::to_value(value).map_err(StoreError::Serialization)?;
        self.create(key, value, ttl_seconds)
    }

    /// Reads `key` with [`read`](Self::read) and deserializes it into `T`
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.read(key)?;
        serde_json::from_value(value).map_err(StoreError::Serialization)
    }

    /// Sweeps every expired entry and persists the store.
    ///
    /// Returns the number of entries removed. This is one tick of the
    /// background cleanup, run on the caller's thread with errors returned.
    pub fn cleanup_expired(&self) -> Result<usize> {
        self.inner.sweep_and_persist()
    }

    /// Starts the background cleanup task, sweeping and persisting every `interval`.
    ///
    /// The first sweep runs immediately. Persist failures during a sweep are
    /// logged and retried on the next tick.
    ///
    /// # Errors
    ///
    /// - [`StoreError::CleanupAlreadyRunning`] if a task is already running
    /// - [`StoreError::InvalidCleanupInterval`] if `interval` is zero
    /// - [`StoreError::NoRuntime`] if called outside a Tokio runtime
    pub fn start_auto_cleanup(&self, interval: Duration) -> Result<()> {
        let mut cleanup = self.inner.cleanup.lock();
        if cleanup.as_ref().is_some_and(|task| !task.is_finished()) {
            return Err(StoreError::CleanupAlreadyRunning);
        }

        *cleanup = Some(CleanupTask::spawn(Arc::downgrade(&self.inner), interval)?);
        Ok(())
    }

    /// Stops the background cleanup task.
    ///
    /// Returns `true` if a task was running.
    pub fn stop_auto_cleanup(&self) -> bool {
        match self.inner.cleanup.lock().take() {
            Some(task) => {
                let was_running = !task.is_finished();
                task.stop();
                was_running
            }
            None => false,
        }
    }

    /// Returns `true` while the background cleanup task is running
    pub fn is_auto_cleanup_running(&self) -> bool {
        self.inner
            .cleanup
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Returns the number of entries in the store (including expired ones)
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    /// Returns `true` if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.store.lock().is_empty()
    }

    /// Returns the storage file path
    pub fn path(&self) -> &Path {
        self.inner.config.path()
    }

    /// Returns the configuration this store was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}
