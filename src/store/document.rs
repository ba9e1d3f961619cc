//! Document Module
//!
//! Metadata stored alongside every document.

use serde::{Deserialize, Serialize};

/// Mimetype recorded for documents that are a single URL to redirect to.
const REDIRECT_MIMETYPE: &str = "url-redirect";

// == Document Kind ==
/// How a document is served on retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Returned as the response body
    Inline,
    /// Payload is a URL the client is redirected to
    Redirect,
}

// == Document Info ==
/// Metadata describing a stored document.
///
/// Serialized as JSON under `info.<key>`; the field names are shared with
/// the HTTP `x-haste-*` headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    /// Key the document is stored under, filled in at write time
    pub key: String,
    /// Uploaded file name, or the static document name
    pub name: String,
    /// Raw size in bytes, before compression
    pub size: u64,
    /// File extension of the upload, used for highlighting (may be empty)
    pub syntax: String,
    /// Declared or detected content type
    pub mimetype: String,
    /// Declared transfer encoding of the upload
    pub encoding: String,
    /// Creation time in Unix milliseconds
    pub time: i64,
}

impl DocumentInfo {
    /// Metadata for a plain-text paste created now.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            key: String::new(),
            name: name.into(),
            size: 0,
            syntax: String::new(),
            mimetype: "text/plain".to_string(),
            encoding: "utf-8".to_string(),
            time: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        if self.mimetype == REDIRECT_MIMETYPE {
            DocumentKind::Redirect
        } else {
            DocumentKind::Inline
        }
    }

    pub fn set_kind(&mut self, kind: DocumentKind) {
        match kind {
            DocumentKind::Redirect => self.mimetype = REDIRECT_MIMETYPE.to_string(),
            DocumentKind::Inline if self.kind() == DocumentKind::Redirect => {
                self.mimetype = "text/plain".to_string();
            }
            DocumentKind::Inline => {}
        }
    }
}

/// Text after the last `.` of a file name, if any.
pub fn extension_of(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}
