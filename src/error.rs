//! Error types for the paste server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Haste Error Enum ==
/// Unified error type for the document engine and its HTTP surface.
#[derive(Error, Debug)]
pub enum HasteError {
    /// No document stored under the key
    #[error("Couldn't find document with key {0}")]
    NotFound(String),

    /// Encoded payload is larger than the configured maximum
    #[error("Document exceeds maximum length of {max} bytes (doc size is {actual} bytes after gzip+base64)")]
    DocumentTooLarge { max: usize, actual: usize },

    /// Requested content types don't cover the document's type
    #[error("Requested document does not support acceptable content-type (requested: {requested}, document: {mimetype})")]
    NotAcceptable { requested: String, mimetype: String },

    /// Backend rejected the operation or is unreachable
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Stored data could not be decoded
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for HasteError {
    fn from(err: redis::RedisError) -> Self {
        HasteError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for HasteError {
    fn from(err: serde_json::Error) -> Self {
        HasteError::Internal(format!("malformed document metadata: {}", err))
    }
}

impl From<std::io::Error> for HasteError {
    fn from(err: std::io::Error) -> Self {
        HasteError::Internal(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for HasteError {
    fn into_response(self) -> Response {
        let status = match &self {
            HasteError::NotFound(_) => StatusCode::NOT_FOUND,
            HasteError::DocumentTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HasteError::NotAcceptable { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            HasteError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HasteError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            HasteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the paste server.
pub type Result<T> = std::result::Result<T, HasteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message_has_sizes() {
        let err = HasteError::DocumentTooLarge {
            max: 100,
            actual: 250,
        };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("250"));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (HasteError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (
                HasteError::DocumentTooLarge { max: 1, actual: 2 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                HasteError::NotAcceptable {
                    requested: "image/png".into(),
                    mimetype: "text/plain".into(),
                },
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                HasteError::Store("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                HasteError::InvalidRequest("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
