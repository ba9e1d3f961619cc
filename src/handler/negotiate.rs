//! Content-type negotiation for document retrieval.

use tracing::warn;

use crate::error::{HasteError, Result};
use crate::store::{extension_of, DocumentInfo};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Maps a file extension to its content type.
pub fn mimetype_for_extension(extension: &str) -> Option<&'static str> {
    let mimetype = match extension.to_ascii_lowercase().as_str() {
        "txt" | "text" | "conf" | "log" | "ini" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "text/yaml",
        "sh" => "application/x-sh",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        "wasm" => "application/wasm",
        "bin" | "exe" | "dll" | "so" => OCTET_STREAM,
        _ => return None,
    };
    Some(mimetype)
}

/// Content type for a file name, from its extension.
pub fn mimetype_for_name(name: &str) -> Option<&'static str> {
    extension_of(name).and_then(mimetype_for_extension)
}

/// Picks the content type to serve `info` with, or rejects the request.
///
/// A known extension on `requested_id` wins over the stored mimetype and
/// skips the Accept check. Otherwise `accept` must contain the mimetype,
/// its `type/*` wildcard, or `*/*`. A missing Accept header allows anything.
pub fn negotiate(info: &DocumentInfo, requested_id: &str, accept: Option<&str>) -> Result<String> {
    let url_type = mimetype_for_name(requested_id);
    let mimetype = match url_type {
        Some(t) if t != OCTET_STREAM => t.to_string(),
        _ => info.mimetype.clone(),
    };

    let accept = match (url_type, accept) {
        (Some(_), _) | (None, None) => return Ok(mimetype),
        (None, Some(accept)) => accept,
    };

    let mut acceptable = vec![mimetype.clone(), "*/*".to_string()];
    if let Some((top, _)) = mimetype.split_once('/') {
        acceptable.push(format!("{}/*", top));
    }

    if acceptable.iter().any(|candidate| accept.contains(candidate.as_str())) {
        Ok(mimetype)
    } else {
        warn!(
            requested = accept,
            doctype = %info.mimetype,
            "document content type is not allowed per request"
        );
        Err(HasteError::NotAcceptable {
            requested: accept.to_string(),
            mimetype,
        })
    }
}
