//! Background Tasks Module
//!
//! Work that runs outside the request path.
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired keys from the memory backend
//! - Seeding: stores the configured static documents at startup

mod cleanup;
mod seed;

pub use cleanup::spawn_cleanup_task;
pub use seed::seed_static_documents;
