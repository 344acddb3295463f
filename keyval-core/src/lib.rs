//! # Keyval Core
//!
//! A file-backed key-value store with per-entry TTL (time-to-live) support.
//!
//! ## Features
//!
//! - Values are arbitrary JSON documents (`serde_json::Value`)
//! - Write-through persistence: every change rewrites one JSON file
//! - Automatic expiration on read and delete (lazy eviction)
//! - Optional background cleanup task with explicit start and stop
//! - One lock per store, so every operation and its persist are atomic
//!   with respect to each other
//!
//! ## Storage file
//!
//! ```json
//! {
//!   "session1": { "value": {"user": "alice"}, "expirationTime": 1700000005000 },
//!   "cfg":      { "value": {"x": 1},          "expirationTime": -1 }
//! }
//! ```
//!
//! `expirationTime` is in milliseconds since the Unix epoch, `-1` meaning the
//! entry never expires.
//!
//! ## Example
//!
//! ```rust,no_run
//! use keyval_core::{KeyValueDataStore, StoreConfig};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> keyval_core::Result<()> {
//!     let store = KeyValueDataStore::open(StoreConfig::new("/tmp/kv_store.json"))?;
//!
//!     // Store a value with a 60 second TTL
//!     store.create("user:123", json!({"name": "John Doe"}), 60)?;
//!
//!     // Retrieve the value
//!     let user = store.read("user:123")?;
//!     println!("User: {}", user);
//!
//!     // Sweep expired keys every 30 seconds
//!     store.start_auto_cleanup(Duration::from_secs(30))?;
//!
//!     store.delete("user:123")?;
//!     Ok(())
//! }
//! ```

mod cleanup;
mod clock;
mod config;
mod datastore;
mod entry;
mod error;
mod persist;
mod store;
mod validate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    default_path, StoreConfig, DEFAULT_FILE_NAME, DEFAULT_MAX_FILE_BYTES, DEFAULT_MAX_KEY_LENGTH,
    DEFAULT_MAX_VALUE_BYTES,
};
pub use datastore::KeyValueDataStore;
pub use entry::{Entry, NO_EXPIRATION};
pub use error::{PersistError, Result, StoreError};
pub use persist::{load, save};
pub use store::Store;
pub use validate::{validate_key, validate_value};
