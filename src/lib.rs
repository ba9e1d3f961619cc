//! Haste Store - A paste server with expiring, compressed documents
//!
//! Documents are gzip+base64 encoded, stored under generated keys on a
//! Redis-style backend, and served back with content negotiation.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod handler;
pub mod keygen;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{HasteError, Result};
pub use handler::DocumentHandler;
pub use store::DocumentStore;
pub use tasks::{seed_static_documents, spawn_cleanup_task};
