use crate::error::quoted;
use thiserror::Error;

/// Definition-time and access-time failures of the static catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StaticError {
    #[error("could not create {name:?}, name in use by {existing}")]
    TypeConflict { name: String, existing: String },

    #[error("could not create {name:?}, name in use by {existing}")]
    InstanceConflict { name: String, existing: String },

    #[error("could not create {name:?}, expected attr {}", quoted(.attrs))]
    ExpectedAttribute { name: String, attrs: Vec<String> },

    #[error("could not create {name:?}, unexpected attr {}", quoted(.attrs))]
    UnexpectedAttribute { name: String, attrs: Vec<String> },

    #[error("frozen attribute {field:?} on {member}")]
    FrozenAttribute { member: String, field: String },

    #[error("{member} has no attribute {field:?}")]
    UnknownAttribute { member: String, field: String },

    #[error("category {category:?} cannot declare field {field:?}: {reason}")]
    InvalidField {
        category: String,
        field: String,
        reason: &'static str,
    },
}
