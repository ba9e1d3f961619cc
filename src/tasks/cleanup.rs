//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired keys out of the memory
//! backend. Reads already skip expired keys; the sweep reclaims their memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::MemoryBackend;

/// Spawns a background task that periodically removes expired keys.
///
/// # Arguments
/// * `backend` - Shared memory backend to sweep
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_cleanup_task(backend: Arc<MemoryBackend>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = backend.cleanup_expired().await;
            if removed > 0 {
                info!("TTL cleanup: removed {} expired keys", removed);
            } else {
                debug!("TTL cleanup: no expired keys found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{KvBackend, Transaction};

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_keys() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .exec(
                Transaction::new()
                    .set("data.short", "v")
                    .expire("data.short", 1)
                    .set("data.long", "v")
                    .expire("data.long", 3600),
            )
            .await
            .unwrap();

        let handle = spawn_cleanup_task(backend.clone(), 1);
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(backend.len().await, 1);
        let values = backend
            .mget(&["data.short".to_string(), "data.long".to_string()])
            .await
            .unwrap();
        assert_eq!(values, vec![None, Some("v".to_string())]);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(Arc::new(MemoryBackend::new()), 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
