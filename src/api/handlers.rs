//! API Handlers
//!
//! HTTP request handlers for each paste server endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{
        header::{self, HeaderMap, HeaderName, HeaderValue},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

use crate::error::{HasteError, Result};
use crate::handler::{DocumentHandler, DocumentHeaders, Retrieved, Submission};
use crate::models::{HealthResponse, StoreResponse};
use crate::store::{DocumentInfo, StoreOptions};

/// Upper bound on a raw request body read into memory
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentHandler>,
}

impl AppState {
    pub fn new(documents: DocumentHandler) -> Self {
        Self {
            documents: Arc::new(documents),
        }
    }
}

// == Response Helpers ==
fn accept_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
}

/// Content headers plus the `x-haste-*` metadata headers.
///
/// Metadata values that can't be sent as a header (control characters in a
/// file name, say) are left out rather than failing the request.
fn document_header_map(doc: &DocumentHeaders, content_length: u64) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    let content_type = HeaderValue::from_str(&doc.content_type).map_err(|_| {
        HasteError::Internal(format!("invalid content type {:?}", doc.content_type))
    })?;
    map.insert(header::CONTENT_TYPE, content_type);
    map.insert(header::CONTENT_LENGTH, HeaderValue::from(content_length));

    for (name, value) in doc.haste_headers() {
        match HeaderValue::from_bytes(value.as_bytes()) {
            Ok(value) => {
                map.insert(HeaderName::from_static(name), value);
            }
            Err(_) => debug!(header = name, "skipping header with unsendable value"),
        }
    }
    Ok(map)
}

fn redirect_to(location: &str) -> Result<Response> {
    let location = HeaderValue::from_str(location)
        .map_err(|_| HasteError::Internal(format!("invalid redirect target {:?}", location)))?;
    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response())
}

// == Store ==
/// Handler for POST /docs
///
/// Accepts either a raw body or `multipart/form-data` carrying a `data`
/// text field or a file.
pub async fn post_document(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<StoreResponse>> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| HasteError::InvalidRequest(rejection.body_text()))?;
        return store_multipart(&state, multipart).await;
    }

    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| HasteError::InvalidRequest(format!("unreadable body: {}", e)))?;
    let key = state
        .documents
        .store_document(Submission::paste(body.to_vec()), StoreOptions::default())
        .await?;
    Ok(Json(StoreResponse::new(key)))
}

/// Stores the first usable part of a multipart body.
async fn store_multipart(state: &AppState, mut multipart: Multipart) -> Result<Json<StoreResponse>> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        HasteError::InvalidRequest(format!("malformed multipart body: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let field_name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let encoding = field
            .headers()
            .get("content-transfer-encoding")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        match (file_name, field_name.as_deref()) {
            (Some(file_name), _) => {
                let data = field.bytes().await.map_err(invalid)?;
                let submission = Submission::upload(
                    &file_name,
                    content_type.as_deref(),
                    encoding.as_deref(),
                    data.to_vec(),
                );
                let key = state
                    .documents
                    .store_document(submission, StoreOptions::default())
                    .await?;
                return Ok(Json(StoreResponse::upload(key, &file_name)));
            }
            (None, Some("data")) => {
                let data = field.bytes().await.map_err(invalid)?;
                let key = state
                    .documents
                    .store_document(Submission::paste(data.to_vec()), StoreOptions::default())
                    .await?;
                return Ok(Json(StoreResponse::new(key)));
            }
            (None, other) => debug!(field = ?other, "ignoring multipart field"),
        }
    }

    warn!("multipart upload without a data field or file");
    Err(HasteError::InvalidRequest(
        "expected a `data` field or a file".to_string(),
    ))
}

// == Retrieve ==
/// Handler for GET /docs/:id
///
/// Serves the document body, or a 301 to the stored URL for redirects.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    match state
        .documents
        .retrieve_document(&id, accept_header(&headers))
        .await?
    {
        Retrieved::Redirect { location, .. } => redirect_to(&location),
        Retrieved::Inline { headers, data } => {
            let map = document_header_map(&headers, data.len() as u64)?;
            Ok((StatusCode::OK, map, Body::from(data)).into_response())
        }
    }
}

/// Handler for HEAD /docs/:id
pub async fn head_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let doc = state
        .documents
        .head_document(&id, accept_header(&headers))
        .await?;
    let map = document_header_map(&doc, doc.info.size)?;
    Ok((StatusCode::OK, map).into_response())
}

// == Listings ==
/// Handler for GET /recent
pub async fn recent_documents(State(state): State<AppState>) -> Result<Json<Vec<DocumentInfo>>> {
    Ok(Json(state.documents.list_recent().await?))
}

/// Handler for GET /keys/:keys
///
/// `keys` is a comma separated list; unknown keys are left out.
pub async fn documents_by_keys(
    State(state): State<AppState>,
    Path(keys): Path<String>,
) -> Result<Json<Vec<DocumentInfo>>> {
    Ok(Json(state.documents.get_metadata_for_keys(&keys).await?))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
