//! API Module
//!
//! HTTP handlers and routing for the paste server.
//!
//! # Endpoints
//! - `POST /docs` - Store a document
//! - `GET /docs/:id` - Fetch a document or follow its redirect
//! - `HEAD /docs/:id` - Document headers only
//! - `GET /recent` - Recently written documents
//! - `GET /keys/:keys` - Metadata lookup by key list
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
