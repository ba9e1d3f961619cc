//! Document Store Module
//!
//! Persists document metadata, payloads and the recency index on a
//! [`KvBackend`], committing every write as one transaction.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::backend::{KvBackend, Transaction, TxOutcome};
use crate::error::{HasteError, Result};
use crate::store::{DocumentInfo, RECENT_KEY, RECENT_LIMIT};

fn info_key(key: &str) -> String {
    format!("info.{}", key)
}

fn data_key(key: &str) -> String {
    format!("data.{}", key)
}

/// Options for reads and writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Static documents never expire and reads don't touch their TTL
    pub is_static: bool,
}

impl StoreOptions {
    pub fn static_doc() -> Self {
        Self { is_static: true }
    }
}

/// Metadata plus the encoded payload as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub info: DocumentInfo,
    /// gzip + base64 payload
    pub data: String,
}

// == Document Store ==
/// Document persistence over a shared backend handle.
#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn KvBackend>,
    /// TTL in seconds for non-static documents
    expire: Option<u64>,
}

impl DocumentStore {
    // == Constructor ==
    /// Creates a store on `backend`; `expire` of None keeps documents forever.
    pub fn new(backend: Arc<dyn KvBackend>, expire: Option<u64>) -> Self {
        Self { backend, expire }
    }

    /// Metadata, payload, TTLs and recency update as one transaction.
    fn write_tx(
        &self,
        key: &str,
        info: &DocumentInfo,
        data: &str,
        options: StoreOptions,
    ) -> Result<Transaction> {
        let info_key = info_key(key);
        let data_key = data_key(key);

        let mut tx = Transaction::new()
            .set(info_key.clone(), serde_json::to_string(info)?)
            .set(data_key.clone(), data);
        if let (false, Some(ttl)) = (options.is_static, self.expire) {
            tx = tx.expire(info_key, ttl).expire(data_key, ttl);
        }
        Ok(tx
            .lrem(RECENT_KEY, key)
            .lpush(RECENT_KEY, key)
            .ltrim(RECENT_KEY, 0, RECENT_LIMIT as i64 - 1))
    }

    // == Set ==
    /// Stores a document under `key`, overwriting whatever was there.
    ///
    /// Either every effect is visible afterwards or, on error, none is.
    pub async fn set(
        &self,
        key: &str,
        info: &DocumentInfo,
        data: &str,
        options: StoreOptions,
    ) -> Result<()> {
        let tx = self.write_tx(key, info, data, options)?;
        match self.backend.exec(tx).await {
            Ok(_) => {
                debug!(key, is_static = options.is_static, "stored document");
                Ok(())
            }
            Err(err) => {
                error!(key, error = %err, "error during set");
                Err(err)
            }
        }
    }

    // == Claim ==
    /// Stores a non-static document only if `key` is not already taken.
    ///
    /// Returns false, writing nothing, when a document exists under `key`.
    pub async fn claim(&self, key: &str, info: &DocumentInfo, data: &str) -> Result<bool> {
        let tx = self
            .write_tx(key, info, data, StoreOptions::default())?
            .unless_exists(info_key(key));
        match self.backend.exec(tx).await {
            Ok(TxOutcome::Committed) => {
                debug!(key, "claimed key for new document");
                Ok(true)
            }
            Ok(TxOutcome::Aborted) => Ok(false),
            Err(err) => {
                error!(key, error = %err, "error during claim");
                Err(err)
            }
        }
    }

    // == Get ==
    /// Fetches a document, or None when nothing is stored under `key`.
    ///
    /// Reading a non-static document restarts its TTL.
    pub async fn get(&self, key: &str, options: StoreOptions) -> Result<Option<StoredDocument>> {
        let info_key = info_key(key);
        let data_key = data_key(key);

        let mut values = self
            .backend
            .mget(&[info_key.clone(), data_key.clone()])
            .await?
            .into_iter();
        let (info, data) = match (values.next().flatten(), values.next().flatten()) {
            (Some(info), Some(data)) => (info, data),
            (Some(_), None) => {
                warn!(key, "document metadata present without payload");
                return Ok(None);
            }
            _ => return Ok(None),
        };

        if let (false, Some(ttl)) = (options.is_static, self.expire) {
            self.backend
                .exec(Transaction::new().expire(info_key, ttl).expire(data_key, ttl))
                .await?;
        }

        Ok(Some(StoredDocument {
            info: serde_json::from_str(&info)?,
            data,
        }))
    }

    // == Get Metadata ==
    /// Batch metadata lookup; keys without a document are left out.
    pub async fn get_metadata(&self, keys: &[String]) -> Result<Vec<DocumentInfo>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let info_keys: Vec<String> = keys.iter().map(|k| info_key(k)).collect();
        self.backend
            .mget(&info_keys)
            .await?
            .into_iter()
            .flatten()
            .map(|json| serde_json::from_str::<DocumentInfo>(&json).map_err(HasteError::from))
            .collect()
    }

    // == Get Recent ==
    /// Metadata of the most recently written documents, newest first.
    pub async fn get_recent(&self) -> Result<Vec<DocumentInfo>> {
        let keys = self.backend.lrange(RECENT_KEY, 0, -1).await?;
        self.get_metadata(&keys).await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn store_with_ttl(expire: Option<u64>) -> (DocumentStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (DocumentStore::new(backend.clone(), expire), backend)
    }

    fn info(key: &str) -> DocumentInfo {
        DocumentInfo {
            key: key.to_string(),
            ..DocumentInfo::new("")
        }
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (store, _) = store_with_ttl(Some(300));
        store
            .set("abc", &info("abc"), "payload", StoreOptions::default())
            .await
            .unwrap();

        let doc = store.get("abc", StoreOptions::default()).await.unwrap().unwrap();
        assert_eq!(doc.info.key, "abc");
        assert_eq!(doc.data, "payload");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (store, _) = store_with_ttl(Some(300));
        assert!(store
            .get("nope", StoreOptions::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_ttl_applied_to_both_keys() {
        let (store, backend) = store_with_ttl(Some(300));
        store
            .set("k", &info("k"), "d", StoreOptions::default())
            .await
            .unwrap();

        assert!(backend.ttl("info.k").await.is_some());
        assert!(backend.ttl("data.k").await.is_some());
    }

    #[tokio::test]
    async fn test_static_documents_never_expire() {
        let (store, backend) = store_with_ttl(Some(300));
        store
            .set("about", &info("about"), "d", StoreOptions::static_doc())
            .await
            .unwrap();

        assert!(backend.ttl("info.about").await.is_none());
        assert!(backend.ttl("data.about").await.is_none());
    }

    #[tokio::test]
    async fn test_read_refreshes_ttl() {
        let (store, backend) = store_with_ttl(Some(300));
        store
            .set("k", &info("k"), "d", StoreOptions::default())
            .await
            .unwrap();
        backend
            .exec(Transaction::new().expire("info.k", 5).expire("data.k", 5))
            .await
            .unwrap();

        store.get("k", StoreOptions::default()).await.unwrap();
        assert!(backend.ttl("info.k").await.unwrap() > 5);
        assert!(backend.ttl("data.k").await.unwrap() > 5);
    }

    #[tokio::test]
    async fn test_static_read_keeps_ttl() {
        let (store, backend) = store_with_ttl(Some(300));
        store
            .set("k", &info("k"), "d", StoreOptions::default())
            .await
            .unwrap();
        backend
            .exec(Transaction::new().expire("info.k", 5))
            .await
            .unwrap();

        store.get("k", StoreOptions::static_doc()).await.unwrap();
        assert!(backend.ttl("info.k").await.unwrap() <= 5);
    }

    #[tokio::test]
    async fn test_no_ttl_configured() {
        let (store, backend) = store_with_ttl(None);
        store
            .set("k", &info("k"), "d", StoreOptions::default())
            .await
            .unwrap();
        assert!(backend.ttl("info.k").await.is_none());
    }

    #[tokio::test]
    async fn test_claim_refuses_taken_key() {
        let (store, _) = store_with_ttl(Some(300));
        assert!(store.claim("k", &info("k"), "first").await.unwrap());
        assert!(!store.claim("k", &info("k"), "second").await.unwrap());

        let doc = store.get("k", StoreOptions::default()).await.unwrap().unwrap();
        assert_eq!(doc.data, "first");
        assert_eq!(store.get_recent().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_metadata_skips_missing() {
        let (store, _) = store_with_ttl(Some(300));
        for key in ["a", "b"] {
            store
                .set(key, &info(key), "d", StoreOptions::default())
                .await
                .unwrap();
        }

        let keys: Vec<String> = ["a", "zzz", "b"].iter().map(|s| s.to_string()).collect();
        let mut found: Vec<String> = store
            .get_metadata(&keys)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.key)
            .collect();
        found.sort();
        assert_eq!(found, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_recent_is_bounded_and_deduplicated() {
        let (store, _) = store_with_ttl(Some(300));
        for i in 0..25 {
            let key = format!("k{}", i);
            store
                .set(&key, &info(&key), "d", StoreOptions::default())
                .await
                .unwrap();
        }
        store
            .set("k10", &info("k10"), "d", StoreOptions::default())
            .await
            .unwrap();

        let recent: Vec<String> = store
            .get_recent()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.key)
            .collect();
        assert_eq!(recent.len(), RECENT_LIMIT);
        assert_eq!(recent[0], "k10");
        assert_eq!(recent[1], "k24");
        assert_eq!(recent.iter().filter(|k| *k == "k10").count(), 1);
    }

    #[tokio::test]
    async fn test_failed_set_leaves_nothing() {
        let (store, backend) = store_with_ttl(Some(300));
        // Occupy the recency index key with a string so the list ops fail
        backend
            .exec(Transaction::new().set(RECENT_KEY, "broken"))
            .await
            .unwrap();

        let result = store
            .set("k", &info("k"), "d", StoreOptions::default())
            .await;
        assert!(result.is_err());
        assert!(store
            .get("k", StoreOptions::default())
            .await
            .unwrap()
            .is_none());
    }
}
