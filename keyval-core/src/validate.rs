//! Size checks applied before any mutation.

use serde_json::Value;

use crate::error::{Result, StoreError};

/// Fails with [`StoreError::InvalidKey`] if `key` has more than `max` characters
pub fn validate_key(key: &str, max: usize) -> Result<()> {
    let length = key.chars().count();
    if length > max {
        return Err(StoreError::InvalidKey { length, max });
    }
    Ok(())
}

/// Fails with [`StoreError::ValueTooLarge`] if the serialized size of `value`
/// exceeds `max` bytes
pub fn validate_value(value: &Value, max: usize) -> Result<()> {
    let size = serde_json::to_vec(value)
        .map_err(StoreError::Serialization)?
        .len();
    if size > max {
        return Err(StoreError::ValueTooLarge { size, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_at_limit_is_accepted() {
        assert!(validate_key(&"k".repeat(32), 32).is_ok());
        assert!(validate_key("", 32).is_ok());
    }

    #[test]
    fn test_key_over_limit_is_rejected() {
        let err = validate_key(&"k".repeat(33), 32).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { length: 33, max: 32 }));
    }

    #[test]
    fn test_key_length_counts_characters_not_bytes() {
        // 32 characters, 64 bytes
        let key = "é".repeat(32);
        assert!(validate_key(&key, 32).is_ok());
    }

    #[test]
    fn test_value_size_uses_serialized_bytes() {
        // {"d":"xxx..."} is 8 bytes of framing plus the payload
        let value = json!({"d": "x".repeat(92)});
        assert!(validate_value(&value, 100).is_ok());

        let value = json!({"d": "x".repeat(93)});
        let err = validate_value(&value, 100).unwrap_err();
        assert!(matches!(err, StoreError::ValueTooLarge { size: 101, max: 100 }));
    }
}
