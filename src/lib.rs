//! Self-describing structural JSON codec.
//!
//! [`encode`] turns a [`Datum`] tree into a JSON-safe `serde_json::Value`,
//! embedding `$module`/`$type` tags so [`decode`] can rebuild the original
//! type without being told what to expect. Tags resolve through a
//! [`TypeRegistry`]; the [`StaticRegistry`] catalog of categories and members
//! plugs into it as a [`TypeSource`].
//!
//! The `heraldry` binary wraps the same functions for NDJSON streams and
//! catalog documents.

use anyhow::{Context, Result, bail};
use serde_json::Value;

pub mod case;
pub mod codec;
pub mod config;
pub mod datum;
pub mod error;
pub mod resolver;
pub mod schema_loader;
pub mod statics;
pub mod temporal;
pub mod types;

pub use case::{camel_case, snake_case};
pub use codec::{Diagnostic, DiagnosticKind, Encoder, MODULE_KEY, TYPE_KEY, decode, encode};
pub use config::CodecOptions;
pub use datum::{Datum, Fields, Foreign, FromDatum};
pub use error::{CodecError, FieldError};
pub use resolver::{Decoder, TypeRegistry, TypeSource};
pub use schema_loader::{WireSchema, WireViolation};
pub use statics::{
    CatalogDocument, Category, CategoryBuilder, Instance, Member, MemberBuilder, StaticError,
    StaticRegistry, load_catalog_from_path,
};
pub use temporal::Timestamp;
pub use types::{JsonRecord, Record, Shape, Tagged, TypePath, VariantSet};

/// Split input into JSON values, accepting a JSON array, a single value, or NDJSON.
///
/// Empty input is an error. NDJSON is parsed line by line so the error names
/// the offending line.
pub fn parse_json_stream(input: &str) -> Result<Vec<Value>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("No input provided");
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(match value {
            Value::Array(items) => items,
            other => vec![other],
        });
    }

    let mut values = Vec::new();
    for (idx, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Unable to parse JSON value from line {}", idx + 1))?;
        values.push(value);
    }

    if values.is_empty() {
        bail!("No JSON values found in input stream");
    }
    Ok(values)
}

/// Decode every value of a stream (see [`parse_json_stream`]).
pub fn decode_json_stream(
    input: &str,
    registry: &TypeRegistry,
    options: &CodecOptions,
) -> Result<Vec<Datum>> {
    parse_json_stream(input)?
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            decode(value, registry, options)
                .with_context(|| format!("Unable to decode value {}", idx + 1))
        })
        .collect()
}
