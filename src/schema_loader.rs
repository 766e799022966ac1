//! JSON Schema check for encoded output.
//!
//! The wire schema ships inside the crate (`schema/wire.schema.json`) and
//! checks what the decoder relies on: JSON-safe values only, `$module` and
//! `$type` always paired, and special-float markers carrying a known label.
//! It says nothing about the fields of any particular tagged type.

use anyhow::{Context, Result, anyhow};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::OnceLock;

const WIRE_SCHEMA: &str = include_str!("../schema/wire.schema.json");
const SCHEMA_VERSION_POINTER: &str = "/schema_version";

/// Compiled wire schema plus the version it declares.
pub struct WireSchema {
    pub schema_version: String,
    compiled: JSONSchema,
}

/// One schema violation, located by JSON pointer into the checked value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireViolation {
    pub pointer: String,
    pub message: String,
}

impl std::fmt::Display for WireViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pointer = if self.pointer.is_empty() { "/" } else { &self.pointer };
        write!(f, "{pointer}: {}", self.message)
    }
}

fn wire_schema_value() -> Result<&'static Value> {
    static VALUE: OnceLock<Value> = OnceLock::new();
    if let Some(value) = VALUE.get() {
        return Ok(value);
    }
    let parsed: Value =
        serde_json::from_str(WIRE_SCHEMA).context("parsing embedded wire schema")?;
    Ok(VALUE.get_or_init(|| parsed))
}

impl WireSchema {
    pub fn load() -> Result<Self> {
        let raw = wire_schema_value()?;
        let schema_version = extract_schema_version(raw, SCHEMA_VERSION_POINTER)
            .ok_or_else(|| anyhow!("wire schema missing schema_version"))?;
        let compiled = JSONSchema::compile(raw).context("compiling embedded wire schema")?;
        Ok(Self {
            schema_version,
            compiled,
        })
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.compiled.is_valid(value)
    }

    /// Check one encoded value, collecting every violation.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<WireViolation>> {
        self.compiled.validate(value).map_err(|errors| {
            errors
                .map(|err| WireViolation {
                    pointer: err.instance_path.to_string(),
                    message: err.to_string(),
                })
                .collect()
        })
    }
}

fn extract_schema_version(schema: &Value, pointer: &str) -> Option<String> {
    let version = schema.pointer(pointer).and_then(Value::as_str)?;
    if version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}
