//! API Routes
//!
//! Configures the Axum router with all paste server endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    documents_by_keys, get_document, head_document, health_handler, post_document,
    recent_documents, AppState, MAX_BODY_BYTES,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /docs` - Store a document (raw body or multipart)
/// - `GET /docs/:id` - Fetch a document, `id` may carry an extension
/// - `HEAD /docs/:id` - Document headers without the body
/// - `GET /recent` - Metadata of recently written documents
/// - `GET /keys/:keys` - Metadata for comma separated keys
/// - `GET /health` - Health check endpoint
///
/// Raw and multipart uploads to `/docs` share the `MAX_BODY_BYTES` cap.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route(
            "/docs",
            post(post_document).layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .route("/docs/:id", get(get_document).head(head_document))
        .route("/recent", get(recent_documents))
        .route("/keys/:keys", get(documents_by_keys))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
