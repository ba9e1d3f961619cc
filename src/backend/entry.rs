//! Stored Value Module
//!
//! A single keyspace entry of the memory backend, with TTL support.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

// == Value Kind ==
/// Payload of a keyspace entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    List(VecDeque<String>),
}

// == Stored Value ==
/// Represents a single keyspace entry with value and expiry metadata.
#[derive(Debug, Clone)]
pub struct StoredValue {
    /// The stored value
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoredValue {
    // == Constructors ==
    /// Creates a string entry without expiry; SET always clears the TTL.
    pub fn string(value: String) -> Self {
        Self {
            value: Value::Str(value),
            created_at: current_timestamp_ms(),
            expires_at: None,
        }
    }

    /// Creates an empty list entry.
    pub fn list() -> Self {
        Self {
            value: Value::List(VecDeque::new()),
            created_at: current_timestamp_ms(),
            expires_at: None,
        }
    }

    // == Expire ==
    /// Sets the entry to expire `ttl_seconds` from now, replacing any earlier TTL.
    pub fn expire_in(&mut self, ttl_seconds: u64) {
        self.expires_at = Some(current_timestamp_ms() + ttl_seconds * 1000);
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches the expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub(crate) fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Returns remaining TTL in seconds, or None if no expiration is set.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()) / 1000)
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::Str(s) => Some(s),
            Value::List(_) => None,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_string_entry_has_no_ttl() {
        let entry = StoredValue::string("v".to_string());

        assert_eq!(entry.as_str(), Some("v"));
        assert!(entry.expires_at.is_none());
        assert!(entry.ttl_remaining().is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_list_entry_is_not_a_string() {
        let entry = StoredValue::list();
        assert!(entry.as_str().is_none());
    }

    #[test]
    fn test_entry_expiration() {
        let mut entry = StoredValue::string("v".to_string());
        entry.expire_in(1);
        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Some(0));
    }

    #[test]
    fn test_expire_in_replaces_ttl() {
        let mut entry = StoredValue::string("v".to_string());
        entry.expire_in(1);
        entry.expire_in(100);

        let remaining = entry.ttl_remaining().unwrap();
        assert!(remaining >= 99 && remaining <= 100);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = StoredValue {
            value: Value::Str("test".to_string()),
            created_at: now,
            expires_at: Some(now),
        };

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - 1));
    }
}
