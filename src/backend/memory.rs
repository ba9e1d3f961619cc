//! Memory Backend Module
//!
//! In-process keyspace with Redis-like strings, lists and lazy TTL expiry.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::entry::{current_timestamp_ms, StoredValue, Value};
use super::{list_range, KvBackend, Op, Transaction, TxOutcome};
use crate::error::{HasteError, Result};

// == Keyspace ==
#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, StoredValue>,
}

impl Keyspace {
    /// Live entry for `key`; expired entries read as missing.
    fn live(&self, key: &str, now: u64) -> Option<&StoredValue> {
        self.entries.get(key).filter(|e| !e.is_expired_at(now))
    }

    fn live_mut(&mut self, key: &str, now: u64) -> Option<&mut StoredValue> {
        self.purge_if_expired(key, now);
        self.entries.get_mut(key)
    }

    fn purge_if_expired(&mut self, key: &str, now: u64) {
        if self.entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            self.entries.remove(key);
        }
    }

    fn apply(&mut self, op: &Op, now: u64) -> Result<()> {
        match op {
            // SET replaces a value of any type, like Redis
            Op::Set { key, value } => {
                self.entries
                    .insert(key.clone(), StoredValue::string(value.clone()));
            }
            Op::Expire { key, seconds } => {
                if let Some(entry) = self.live_mut(key, now) {
                    entry.expire_in(*seconds);
                }
            }
            Op::LRem { key, value } => {
                let emptied = match self.live_mut(key, now) {
                    Some(entry) => {
                        let list = list_of(entry, key)?;
                        list.retain(|v| v != value);
                        list.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    self.entries.remove(key);
                }
            }
            Op::LPush { key, value } => {
                self.purge_if_expired(key, now);
                let entry = self
                    .entries
                    .entry(key.clone())
                    .or_insert_with(StoredValue::list);
                list_of(entry, key)?.push_front(value.clone());
            }
            Op::LTrim { key, start, stop } => {
                let emptied = match self.live_mut(key, now) {
                    Some(entry) => {
                        let list = list_of(entry, key)?;
                        match list_range(list.len(), *start, *stop) {
                            Some(range) => {
                                list.truncate(range.end);
                                list.drain(..range.start);
                            }
                            None => list.clear(),
                        }
                        list.is_empty()
                    }
                    None => false,
                };
                // Redis drops lists that become empty
                if emptied {
                    self.entries.remove(key);
                }
            }
        }
        Ok(())
    }
}

fn list_of<'a>(
    entry: &'a mut StoredValue,
    key: &str,
) -> Result<&'a mut std::collections::VecDeque<String>> {
    match &mut entry.value {
        Value::List(list) => Ok(list),
        Value::Str(_) => Err(wrong_type(key)),
    }
}

fn wrong_type(key: &str) -> HasteError {
    HasteError::Store(format!(
        "WRONGTYPE operation against key '{}' holding the wrong kind of value",
        key
    ))
}

// == Memory Backend ==
/// Keyspace held in process memory.
///
/// Transactions run under the write lock and keep an undo log of every key
/// they touch, so a failing command rolls back the commands before it.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    keyspace: RwLock<Keyspace>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the keyspace.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut keyspace = self.keyspace.write().await;
        let before = keyspace.entries.len();
        keyspace.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - keyspace.entries.len()
    }

    /// Returns the current number of live entries.
    pub async fn len(&self) -> usize {
        let now = current_timestamp_ms();
        let keyspace = self.keyspace.read().await;
        keyspace
            .entries
            .values()
            .filter(|e| !e.is_expired_at(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remaining TTL of `key` in seconds; None when missing or persistent.
    pub async fn ttl(&self, key: &str) -> Option<u64> {
        let keyspace = self.keyspace.read().await;
        keyspace
            .live(key, current_timestamp_ms())
            .and_then(StoredValue::ttl_remaining)
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let now = current_timestamp_ms();
        let keyspace = self.keyspace.read().await;
        Ok(keys
            .iter()
            .map(|key| {
                keyspace
                    .live(key, now)
                    .and_then(StoredValue::as_str)
                    .map(str::to_string)
            })
            .collect())
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let keyspace = self.keyspace.read().await;
        match keyspace.live(key, current_timestamp_ms()).map(|e| &e.value) {
            None => Ok(Vec::new()),
            Some(Value::Str(_)) => Err(wrong_type(key)),
            Some(Value::List(list)) => Ok(list_range(list.len(), start, stop)
                .map(|range| list.range(range).cloned().collect())
                .unwrap_or_default()),
        }
    }

    async fn exec(&self, tx: Transaction) -> Result<TxOutcome> {
        let now = current_timestamp_ms();
        let mut keyspace = self.keyspace.write().await;

        if let Some(guard) = tx.guard() {
            if keyspace.live(guard, now).is_some() {
                debug!(guard, "transaction aborted, guard key exists");
                return Ok(TxOutcome::Aborted);
            }
        }

        let mut undo: HashMap<&str, Option<StoredValue>> = HashMap::new();
        for op in tx.ops() {
            let key = op.key();
            if !undo.contains_key(key) {
                undo.insert(key, keyspace.entries.get(key).cloned());
            }

            if let Err(err) = keyspace.apply(op, now) {
                for (key, previous) in undo {
                    match previous {
                        Some(entry) => keyspace.entries.insert(key.to_string(), entry),
                        None => keyspace.entries.remove(key),
                    };
                }
                return Err(err);
            }
        }

        Ok(TxOutcome::Committed)
    }
}
