//! Backend Module
//!
//! Key-value transport underneath the document store. The contract follows
//! Redis: string values with per-key TTLs, lists, multi-key reads, and
//! transactions that commit all of their commands or none.

mod entry;
mod memory;
mod redis_backend;

pub use entry::{current_timestamp_ms, StoredValue};
pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;

use async_trait::async_trait;

use crate::error::Result;

// == Commands ==
/// A single write queued inside a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// SET key value (clears any TTL)
    Set { key: String, value: String },
    /// EXPIRE key seconds (no-op when the key is missing)
    Expire { key: String, seconds: u64 },
    /// LREM key 0 value
    LRem { key: String, value: String },
    /// LPUSH key value
    LPush { key: String, value: String },
    /// LTRIM key start stop (inclusive, negative indexes count from the end)
    LTrim { key: String, start: i64, stop: i64 },
}

impl Op {
    /// Key the command writes to.
    pub fn key(&self) -> &str {
        match self {
            Op::Set { key, .. }
            | Op::Expire { key, .. }
            | Op::LRem { key, .. }
            | Op::LPush { key, .. }
            | Op::LTrim { key, .. } => key,
        }
    }
}

// == Transaction ==
/// Ordered batch of writes applied atomically.
///
/// With a guard set, the whole batch is skipped when the guard key exists;
/// the check and the writes happen in the same atomic step.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub(crate) guard: Option<String>,
    pub(crate) ops: Vec<Op>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only commit if `key` does not exist at commit time.
    pub fn unless_exists(mut self, key: impl Into<String>) -> Self {
        self.guard = Some(key.into());
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(Op::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn expire(mut self, key: impl Into<String>, seconds: u64) -> Self {
        self.ops.push(Op::Expire {
            key: key.into(),
            seconds,
        });
        self
    }

    pub fn lrem(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(Op::LRem {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn lpush(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ops.push(Op::LPush {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn ltrim(mut self, key: impl Into<String>, start: i64, stop: i64) -> Self {
        self.ops.push(Op::LTrim {
            key: key.into(),
            start,
            stop,
        });
        self
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn guard(&self) -> Option<&str> {
        self.guard.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Result of executing a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    /// Every command was applied
    Committed,
    /// The guard key existed; nothing was applied
    Aborted,
}

// == Backend Trait ==
/// Storage transport used by [`crate::store::DocumentStore`].
///
/// Any failure inside [`KvBackend::exec`] must leave none of the
/// transaction's effects visible and is reported as an error for the whole
/// transaction.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Reads several string values in one round trip, `None` for missing keys.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Returns list elements between `start` and `stop` inclusive.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    /// Applies a transaction atomically.
    async fn exec(&self, tx: Transaction) -> Result<TxOutcome>;
}

/// Resolves Redis-style inclusive list bounds to a `start..end` range.
pub(crate) fn list_range(len: usize, start: i64, stop: i64) -> Option<std::ops::Range<usize>> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        None
    } else {
        Some(start as usize..(stop + 1) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_builder_keeps_order() {
        let tx = Transaction::new()
            .unless_exists("info.a")
            .set("info.a", "{}")
            .expire("info.a", 10)
            .lpush("recent", "a");

        assert_eq!(tx.guard(), Some("info.a"));
        let keys: Vec<&str> = tx.ops().iter().map(Op::key).collect();
        assert_eq!(keys, vec!["info.a", "info.a", "recent"]);
    }

    #[test]
    fn test_list_range() {
        assert_eq!(list_range(5, 0, -1), Some(0..5));
        assert_eq!(list_range(5, 0, 19), Some(0..5));
        assert_eq!(list_range(30, 0, 19), Some(0..20));
        assert_eq!(list_range(5, -2, -1), Some(3..5));
        assert_eq!(list_range(5, 3, 1), None);
        assert_eq!(list_range(0, 0, -1), None);
        assert_eq!(list_range(5, 7, 9), None);
    }
}
