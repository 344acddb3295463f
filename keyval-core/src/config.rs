use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Maximum key length in characters
pub const DEFAULT_MAX_KEY_LENGTH: usize = 32;

/// Maximum serialized value size (16 KiB)
pub const DEFAULT_MAX_VALUE_BYTES: usize = 16 * 1024;

/// Maximum storage file size (1 GiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024 * 1024;

/// File name used under the home directory when no path is configured
pub const DEFAULT_FILE_NAME: &str = "kv_store.json";

/// Configuration for a [`KeyValueDataStore`](crate::KeyValueDataStore)
///
/// # Example
///
/// ```rust
/// use keyval_core::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::new("/tmp/kv_store.json")
///     .with_max_value_bytes(4096)
///     .with_cleanup_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Location of the JSON storage file
    pub path: PathBuf,
    /// Maximum key length in characters (default: 32)
    pub max_key_length: usize,
    /// Maximum serialized value size in bytes (default: 16 KiB)
    pub max_value_bytes: usize,
    /// Persisting is refused once the file on disk is larger than this (default: 1 GiB)
    pub max_file_bytes: u64,
    /// Interval between cleanup runs (default: 60 seconds)
    pub cleanup_interval: Duration,
}

impl StoreConfig {
    /// Creates a configuration with default limits for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            cleanup_interval: Duration::from_secs(60),
        }
    }

    /// Creates a configuration from environment variables.
    ///
    /// Reads:
    /// - `KEYVAL_PATH` - Storage file (defaults to `kv_store.json` in the home directory)
    /// - `KEYVAL_CLEANUP_INTERVAL` - Cleanup interval in seconds (defaults to 60)
    pub fn from_env() -> Self {
        let path = std::env::var_os("KEYVAL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_path(std::env::var_os("HOME")));

        let mut config = Self::new(path);
        if let Some(secs) = std::env::var("KEYVAL_CLEANUP_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.cleanup_interval = Duration::from_secs(secs);
        }
        config
    }

    /// Sets the maximum key length in characters
    pub fn with_max_key_length(mut self, max: usize) -> Self {
        self.max_key_length = max;
        self
    }

    /// Sets the maximum serialized value size in bytes
    pub fn with_max_value_bytes(mut self, max: usize) -> Self {
        self.max_value_bytes = max;
        self
    }

    /// Sets the storage file size ceiling in bytes
    pub fn with_max_file_bytes(mut self, max: u64) -> Self {
        self.max_file_bytes = max;
        self
    }

    /// Sets the cleanup interval
    ///
    /// This is the interval used by callers that start the scheduler from
    /// configuration; [`start_auto_cleanup`](crate::KeyValueDataStore::start_auto_cleanup)
    /// takes its interval explicitly.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Returns the storage file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Resolves the default storage file under `home`, or the working directory
/// when no home is known
pub fn default_path(home: Option<OsString>) -> PathBuf {
    match home {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_FILE_NAME),
        _ => PathBuf::from(DEFAULT_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::new("/tmp/kv.json");
        assert_eq!(config.path(), Path::new("/tmp/kv.json"));
        assert_eq!(config.max_key_length, 32);
        assert_eq!(config.max_value_bytes, 16 * 1024);
        assert_eq!(config.max_file_bytes, 1 << 30);
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_pattern_chaining() {
        let config = StoreConfig::new("kv.json")
            .with_max_key_length(8)
            .with_max_value_bytes(64)
            .with_max_file_bytes(1024)
            .with_cleanup_interval(Duration::from_secs(120));

        assert_eq!(config.max_key_length, 8);
        assert_eq!(config.max_value_bytes, 64);
        assert_eq!(config.max_file_bytes, 1024);
        assert_eq!(config.cleanup_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_default_path_under_home() {
        let path = default_path(Some(OsString::from("/home/alice")));
        assert_eq!(path, PathBuf::from("/home/alice/kv_store.json"));
    }

    #[test]
    fn test_default_path_without_home() {
        assert_eq!(default_path(None), PathBuf::from("kv_store.json"));
        assert_eq!(default_path(Some(OsString::new())), PathBuf::from("kv_store.json"));
    }
}
