//! Handler Module
//!
//! Document-level operations: key assignment, payload encoding, redirect
//! detection and content negotiation on top of the [`crate::store`] layer.

mod codec;
mod document_handler;
mod negotiate;

pub use codec::{decode_payload, encode_payload};
pub use document_handler::{
    strip_extension, DocumentHandler, DocumentHeaders, Retrieved, Submission, DEFAULT_KEY_LENGTH,
    MAX_KEY_ATTEMPTS,
};
pub use negotiate::{mimetype_for_extension, mimetype_for_name, negotiate, OCTET_STREAM};
