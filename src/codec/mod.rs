//! Structural encoder and decoder.
//!
//! [`encode`] walks a [`Datum`](crate::Datum) and produces a JSON-safe
//! `serde_json::Value`, tagging records, variants, dates and catalog values
//! with `$module`/`$type` when [`CodecOptions::type_tags`] is on. [`decode`]
//! reverses it with the help of a [`TypeRegistry`](crate::TypeRegistry).
//!
//! [`CodecOptions::type_tags`]: crate::CodecOptions

mod decode;
mod encode;
pub mod special;

pub use decode::decode;
pub use encode::{Diagnostic, DiagnosticKind, Encoder, encode};

/// Tag key holding the namespace of the encoded type.
pub const MODULE_KEY: &str = "$module";
/// Tag key holding the local name of the encoded type.
pub const TYPE_KEY: &str = "$type";
