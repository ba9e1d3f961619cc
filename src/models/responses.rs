//! Response DTOs for the paste server API
//!
//! Defines the structure of outgoing JSON response bodies. Document metadata
//! listings serialize [`crate::store::DocumentInfo`] directly.

use serde::Serialize;

/// Response body for POST /docs
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    /// Key the document can be fetched under
    pub key: String,
    /// Uploaded file name, present for uploads only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl StoreResponse {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
        }
    }

    /// Response for an uploaded file; an empty name is left out.
    pub fn upload(key: impl Into<String>, name: &str) -> Self {
        Self {
            key: key.into(),
            name: (!name.is_empty()).then(|| name.to_string()),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Healthy status stamped with the current time
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
