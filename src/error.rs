//! Error taxonomy for the codec.
//!
//! Encoding and decoding surface [`CodecError`]; keyword construction of
//! tagged types reports [`FieldError`], which the decoder wraps into
//! [`CodecError::Argument`] together with the type that failed to build.

use crate::statics::StaticError;
use crate::types::TypePath;
use thiserror::Error;

/// Fatal failures of a single encode or decode call.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid identifier {0:?}: identifiers must only have ASCII letters, digits and '_'")]
    InvalidIdentifier(String),

    #[error("could not locate {module}.{name}")]
    TypeResolution { module: String, name: String },

    #[error("bad arguments for {path}: {source}")]
    Argument {
        path: TypePath,
        #[source]
        source: FieldError,
    },

    #[error("{path} uses reserved key {key:?} as a field name")]
    ReservedKey { path: TypePath, key: String },
}

impl CodecError {
    pub(crate) fn unresolved(path: &TypePath) -> Self {
        CodecError::TypeResolution {
            module: path.module.clone(),
            name: path.name.clone(),
        }
    }
}

/// Why a tagged mapping could not be turned back into its type.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("missing field {0:?}")]
    Missing(String),

    #[error("unexpected fields {}", quoted(.0))]
    Unexpected(Vec<String>),

    #[error("field {field:?} expected {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field {field:?}: {reason}")]
    Invalid { field: String, reason: String },

    #[error(transparent)]
    Static(#[from] StaticError),
}

impl FieldError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub(crate) fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("{name:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}
