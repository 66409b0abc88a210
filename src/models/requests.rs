//! Request DTOs for the cache HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{MAX_KEY_LENGTH, MAX_TTL, MAX_VALUE_SIZE};

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses the cache default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if self.ttl == Some(0) {
            return Some("TTL must be at least one second".to_string());
        }
        if self.ttl.is_some_and(|ttl| ttl > MAX_TTL.as_secs()) {
            return Some(format!("TTL exceeds maximum of {} seconds", MAX_TTL.as_secs()));
        }
        let size = serde_json::to_vec(&self.value).map(|v| v.len()).unwrap_or(0);
        if size > MAX_VALUE_SIZE {
            return Some(format!("Value exceeds maximum size of {} bytes", MAX_VALUE_SIZE));
        }
        None
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, json!("hello"));
        assert!(req.ttl.is_none());
        assert!(req.ttl().is_none());
    }

    #[test]
    fn test_set_request_structured_value_with_ttl() {
        let json = r#"{"key": "lead:1", "value": {"score": 87, "tags": ["hot"]}, "ttl": 60}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.value["tags"][0], "hot");
        assert_eq!(req.ttl(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: json!("test"),
            ttl: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key_and_zero_ttl() {
        let long = SetRequest {
            key: "k".repeat(MAX_KEY_LENGTH + 1),
            value: json!(1),
            ttl: None,
        };
        assert!(long.validate().is_some());

        let zero = SetRequest {
            key: "k".to_string(),
            value: json!(1),
            ttl: Some(0),
        };
        assert!(zero.validate().is_some());
    }

    #[test]
    fn test_validate_huge_ttl() {
        let huge = SetRequest {
            key: "k".to_string(),
            value: json!(1),
            ttl: Some(u64::MAX / 2),
        };
        assert!(huge.validate().is_some());

        let at_cap = SetRequest {
            key: "k".to_string(),
            value: json!(1),
            ttl: Some(MAX_TTL.as_secs()),
        };
        assert!(at_cap.validate().is_none());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SetRequest {
            key: "valid_key".to_string(),
            value: json!(null),
            ttl: Some(60),
        };
        assert!(req.validate().is_none());
    }
}
