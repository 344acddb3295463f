use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel stored in the file for entries that never expire
pub const NO_EXPIRATION: i64 = -1;

/// Represents a stored value with its expiration time
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    value: Value,
    /// Epoch milliseconds, `None` means the entry never expires
    expires_at: Option<i64>,
}

impl Entry {
    /// Creates a new entry with the given value and expiration time
    pub fn new(value: Value, expires_at: Option<i64>) -> Self {
        Self { value, expires_at }
    }

    /// Creates an entry expiring `ttl_seconds` after `now_millis`.
    ///
    /// A TTL of zero or less means the entry never expires.
    pub fn with_ttl(value: Value, ttl_seconds: i64, now_millis: i64) -> Self {
        let expires_at = (ttl_seconds > 0)
            .then(|| now_millis.saturating_add(ttl_seconds.saturating_mul(1000)));
        Self::new(value, expires_at)
    }

    /// Returns the stored value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the entry, returning the stored value
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns the expiration time in epoch milliseconds
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// Checks if this entry has expired at `now_millis`.
    ///
    /// The entry is still valid at the exact expiration instant.
    pub fn is_expired(&self, now_millis: i64) -> bool {
        matches!(self.expires_at, Some(expires_at) if now_millis > expires_at)
    }

    pub(crate) fn to_record(&self) -> RecordRef<'_> {
        RecordRef {
            value: &self.value,
            expiration_time: self.expires_at.unwrap_or(NO_EXPIRATION),
        }
    }
}

/// On-disk shape of an entry
#[derive(Debug, Deserialize)]
pub(crate) struct Record {
    value: Value,
    #[serde(rename = "expirationTime")]
    expiration_time: i64,
}

/// Borrowed on-disk shape, used when writing a snapshot
#[derive(Debug, Serialize)]
pub(crate) struct RecordRef<'a> {
    value: &'a Value,
    #[serde(rename = "expirationTime")]
    expiration_time: i64,
}

impl From<Record> for Entry {
    fn from(record: Record) -> Self {
        let expires_at =
            (record.expiration_time != NO_EXPIRATION).then_some(record.expiration_time);
        Entry::new(record.value, expires_at)
    }
}
