//! Document Handler Module
//!
//! Sits between callers and the [`DocumentStore`]: encodes payloads on the
//! way in, assigns keys, and decodes and negotiates on the way out.

use std::collections::HashSet;

use tracing::{debug, info};

use super::codec::{decode_payload, encode_payload};
use super::negotiate::{mimetype_for_name, negotiate, OCTET_STREAM};
use crate::error::{HasteError, Result};
use crate::keygen::KeyGenerator;
use crate::store::{extension_of, DocumentInfo, DocumentKind, DocumentStore, StoreOptions};

/// Key length used unless configured otherwise
pub const DEFAULT_KEY_LENGTH: usize = 10;

/// Candidate keys tried before a write gives up
pub const MAX_KEY_ATTEMPTS: usize = 64;

// == Submission ==
/// A document on its way into the store.
#[derive(Debug, Clone)]
pub struct Submission {
    pub info: DocumentInfo,
    pub data: Vec<u8>,
    /// Whether a lone URL turns the document into a redirect
    pub detect_redirect: bool,
}

impl Submission {
    /// Raw text pasted by a client.
    pub fn paste(data: Vec<u8>) -> Self {
        Self {
            info: DocumentInfo::new(""),
            data,
            detect_redirect: true,
        }
    }

    /// Uploaded file. A generic `application/octet-stream` type is refined
    /// from the file name when the extension is known.
    pub fn upload(
        file_name: &str,
        content_type: Option<&str>,
        encoding: Option<&str>,
        data: Vec<u8>,
    ) -> Self {
        let mut info = DocumentInfo::new(file_name);
        info.mimetype = match content_type {
            None | Some(OCTET_STREAM) => mimetype_for_name(file_name)
                .unwrap_or(OCTET_STREAM)
                .to_string(),
            Some(declared) => declared.to_string(),
        };
        if let Some(encoding) = encoding {
            info.encoding = encoding.to_string();
        }
        info.syntax = extension_of(file_name).unwrap_or_default().to_string();
        Self {
            info,
            data,
            detect_redirect: false,
        }
    }

    /// Pre-seeded document served under `name` minus its extension.
    pub fn static_document(name: &str, syntax: &str, data: Vec<u8>) -> Self {
        let mut info = DocumentInfo::new(name);
        info.key = strip_extension(name).to_string();
        info.syntax = syntax.to_string();
        Self {
            info,
            data,
            detect_redirect: false,
        }
    }
}

// == Retrieval Results ==
/// Resolved response metadata for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeaders {
    pub content_type: String,
    pub info: DocumentInfo,
}

impl DocumentHeaders {
    /// Metadata headers mirroring the stored info.
    pub fn haste_headers(&self) -> Vec<(&'static str, String)> {
        let info = &self.info;
        vec![
            ("x-haste-key", info.key.clone()),
            ("x-haste-name", info.name.clone()),
            ("x-haste-size", info.size.to_string()),
            ("x-haste-syntax", info.syntax.clone()),
            ("x-haste-mimetype", info.mimetype.clone()),
            ("x-haste-encoding", info.encoding.clone()),
            ("x-haste-time", info.time.to_string()),
        ]
    }
}

/// Outcome of a successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieved {
    /// Serve `data` as the body
    Inline {
        headers: DocumentHeaders,
        data: Vec<u8>,
    },
    /// Send the client to `location`
    Redirect {
        location: String,
        info: DocumentInfo,
    },
}

/// Payload of a lone `http(s)://` line, if `data` is exactly that.
///
/// Only the first 8 bytes decide whether the scheme matches; the whole
/// buffer must then be valid UTF-8 holding a single line.
fn redirect_target(data: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(&data[..data.len().min(8)]).to_lowercase();
    if !head.starts_with("http://") && !head.starts_with("https://") {
        return None;
    }
    let text = std::str::from_utf8(data).ok()?.replace('\r', "");
    let mut lines = text.lines();
    let url = lines.next()?;
    match lines.next() {
        None => Some(url.to_string()),
        Some(_) => None,
    }
}

/// Drops a trailing `.ext` from a requested id.
pub fn strip_extension(id: &str) -> &str {
    match id.rfind('.') {
        Some(idx) => &id[..idx],
        None => id,
    }
}

// == Document Handler ==
/// Entry point for storing and serving documents.
pub struct DocumentHandler {
    store: DocumentStore,
    key_generator: Box<dyn KeyGenerator>,
    key_length: usize,
    /// Cap on the gzip+base64 payload size
    max_length: Option<usize>,
    /// Names of pre-seeded documents; reads of these never refresh a TTL
    static_names: HashSet<String>,
}

impl DocumentHandler {
    pub fn new(store: DocumentStore, key_generator: Box<dyn KeyGenerator>) -> Self {
        Self {
            store,
            key_generator,
            key_length: DEFAULT_KEY_LENGTH,
            max_length: None,
            static_names: HashSet::new(),
        }
    }

    pub fn with_key_length(mut self, key_length: usize) -> Self {
        self.key_length = key_length;
        self
    }

    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_static_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_names.extend(names.into_iter().map(|name| {
            let name: String = name.into();
            strip_extension(&name).to_string()
        }));
        self
    }

    fn read_options(&self, key: &str) -> StoreOptions {
        StoreOptions {
            is_static: self.static_names.contains(key),
        }
    }

    // == Store ==
    /// Encodes and stores a document, returning the key it was stored under.
    ///
    /// Static writes are keyed by the document name without its extension
    /// and overwrite; all others
    /// get a freshly generated key that no existing document holds.
    pub async fn store_document(
        &self,
        submission: Submission,
        options: StoreOptions,
    ) -> Result<String> {
        let Submission {
            mut info,
            mut data,
            detect_redirect,
        } = submission;

        if detect_redirect {
            if let Some(url) = redirect_target(&data) {
                info.set_kind(DocumentKind::Redirect);
                data = url.into_bytes();
            }
        }
        info.size = data.len() as u64;

        let encoded = encode_payload(&data)?;
        if let Some(max) = self.max_length {
            if encoded.len() > max {
                return Err(HasteError::DocumentTooLarge {
                    max,
                    actual: encoded.len(),
                });
            }
        }

        if options.is_static {
            info.key = strip_extension(&info.name).to_string();
            self.store.set(&info.key, &info, &encoded, options).await?;
            return Ok(info.key);
        }

        for _ in 0..MAX_KEY_ATTEMPTS {
            let candidate = self.key_generator.create_key(self.key_length);
            info.key = candidate.clone();
            if self.store.claim(&candidate, &info, &encoded).await? {
                info!(key = %candidate, size = info.size, "stored document");
                return Ok(candidate);
            }
            debug!(key = %candidate, "key already taken, choosing another");
        }
        Err(HasteError::Store(format!(
            "no free key found after {} attempts",
            MAX_KEY_ATTEMPTS
        )))
    }

    // == Retrieve ==
    /// Loads, decodes and negotiates the document behind `id`.
    pub async fn retrieve_document(&self, id: &str, accept: Option<&str>) -> Result<Retrieved> {
        let key = strip_extension(id);
        let doc = self
            .store
            .get(key, self.read_options(key))
            .await?
            .ok_or_else(|| HasteError::NotFound(key.to_string()))?;

        let mut info = doc.info;
        info.key = key.to_string();
        debug!(key, mimetype = %info.mimetype, "retrieved document");
        let data = decode_payload(&doc.data)?;

        match info.kind() {
            DocumentKind::Redirect => {
                let location = String::from_utf8(data).map_err(|_| {
                    HasteError::Internal(format!("redirect target of {} is not UTF-8", key))
                })?;
                Ok(Retrieved::Redirect { location, info })
            }
            DocumentKind::Inline => {
                let content_type = negotiate(&info, id, accept)?;
                Ok(Retrieved::Inline {
                    headers: DocumentHeaders { content_type, info },
                    data,
                })
            }
        }
    }

    // == Head ==
    /// Resolves headers for `id` without loading the payload.
    pub async fn head_document(&self, id: &str, accept: Option<&str>) -> Result<DocumentHeaders> {
        let key = strip_extension(id);
        let mut info = self
            .store
            .get_metadata(&[key.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HasteError::NotFound(key.to_string()))?;
        info.key = key.to_string();

        let content_type = match info.kind() {
            DocumentKind::Redirect => info.mimetype.clone(),
            DocumentKind::Inline => negotiate(&info, id, accept)?,
        };
        Ok(DocumentHeaders { content_type, info })
    }

    /// True when a document is stored under `key`. Doesn't touch its TTL.
    pub async fn has_document(&self, key: &str) -> Result<bool> {
        Ok(!self.store.get_metadata(&[key.to_string()]).await?.is_empty())
    }

    // == Listings ==
    /// Metadata of the most recently written documents.
    pub async fn list_recent(&self) -> Result<Vec<DocumentInfo>> {
        self.store.get_recent().await
    }

    /// Metadata for a comma separated list of keys, skipping unknown ones.
    pub async fn get_metadata_for_keys(&self, csv_keys: &str) -> Result<Vec<DocumentInfo>> {
        let keys: Vec<String> = csv_keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if keys.is_empty() {
            return Err(HasteError::InvalidRequest("no keys given".to_string()));
        }
        self.store.get_metadata(&keys).await
    }
}
