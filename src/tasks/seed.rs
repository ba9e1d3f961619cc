//! Static Document Seeding
//!
//! Loads the configured documents from disk at startup and stores them under
//! their names, minus any extension, without an expiry.

use std::path::Path;

use tracing::{info, warn};

use crate::handler::{strip_extension, DocumentHandler, Submission};
use crate::store::{extension_of, StoreOptions};

/// Writes every `(name, path)` document that isn't stored yet.
///
/// A missing or unreadable file is logged and skipped; seeding never stops
/// the server from starting. Returns the number of documents written.
pub async fn seed_static_documents(handler: &DocumentHandler, documents: &[(String, String)]) -> usize {
    let mut seeded = 0;

    for (name, path) in documents {
        match handler.has_document(strip_extension(name)).await {
            Ok(true) => {
                info!(name = %name, "static document already present");
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(name = %name, error = %e, "could not check static document");
                continue;
            }
        }

        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(name = %name, path = %path, error = %e, "failed to read static document");
                continue;
            }
        };

        let syntax = Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(extension_of)
            .unwrap_or_default();
        let submission = Submission::static_document(name, syntax, data);
        match handler
            .store_document(submission, StoreOptions::static_doc())
            .await
        {
            Ok(key) => {
                info!(key = %key, path = %path, "loaded static document");
                seeded += 1;
            }
            Err(e) => warn!(name = %name, error = %e, "failed to store static document"),
        }
    }

    seeded
}
