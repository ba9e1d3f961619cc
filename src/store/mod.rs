//! Store Module
//!
//! Document persistence: metadata, encoded payloads, TTLs and the recency index.

mod document;
mod document_store;


// Re-export public types
pub use document::{extension_of, DocumentInfo, DocumentKind};
pub use document_store::{DocumentStore, StoreOptions, StoredDocument};

// == Public Constants ==
/// Backend list holding the most recently written keys
pub const RECENT_KEY: &str = "recent";

/// Maximum number of keys kept in the recency index
pub const RECENT_LIMIT: usize = 20;
