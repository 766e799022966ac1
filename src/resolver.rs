//! Decode-side type lookup.
//!
//! A [`TypeRegistry`] maps each [`TypePath`] seen in a `$module`/`$type` tag to
//! a [`Decoder`] describing how to rebuild the value. Paths registered
//! explicitly win; otherwise every attached [`TypeSource`] is asked in
//! attachment order. Nothing is cached, so sources that grow at runtime (the
//! static catalog) are always seen in their current state.

use crate::codec::special;
use crate::datum::{Datum, Fields};
use crate::error::{CodecError, FieldError};
use crate::temporal;
use crate::types::{JsonRecord, Record, TypePath, VariantSet};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type BuildFn = dyn Fn(Fields) -> Result<Datum, FieldError> + Send + Sync;
type VariantFn = dyn Fn(&str) -> Option<Datum> + Send + Sync;

/// Reconstruction strategy for one tagged type.
#[derive(Clone)]
pub enum Decoder {
    /// Custom parser; receives the remaining keys exactly as written.
    Custom(Arc<BuildFn>),
    /// Named-variant lookup by the `name` field.
    Variant(Arc<VariantFn>),
    /// NaN and the infinities, read from the `x` field.
    SpecialFloat,
    /// Keyword construction; keys are snake-cased first when camel keys are on.
    Keyword(Arc<BuildFn>),
}

impl Decoder {
    pub fn custom(build: impl Fn(Fields) -> Result<Datum, FieldError> + Send + Sync + 'static) -> Self {
        Decoder::Custom(Arc::new(build))
    }

    pub fn keyword(build: impl Fn(Fields) -> Result<Datum, FieldError> + Send + Sync + 'static) -> Self {
        Decoder::Keyword(Arc::new(build))
    }

    pub fn variant(lookup: impl Fn(&str) -> Option<Datum> + Send + Sync + 'static) -> Self {
        Decoder::Variant(Arc::new(lookup))
    }

    /// Whether keys should be snake-cased before [`Decoder::build`].
    pub fn wants_snake_keys(&self) -> bool {
        matches!(self, Decoder::Keyword(_))
    }

    /// Rebuild a value from its decoded fields (tag already removed).
    pub fn build(&self, mut fields: Fields) -> Result<Datum, FieldError> {
        match self {
            Decoder::Custom(build) | Decoder::Keyword(build) => build(fields),
            Decoder::Variant(lookup) => {
                let name: String = fields.take("name")?;
                lookup(&name)
                    .ok_or_else(|| FieldError::invalid("name", format!("no variant named {name:?}")))
            }
            Decoder::SpecialFloat => special::from_fields(fields),
        }
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Decoder::Custom(_) => "Custom",
            Decoder::Variant(_) => "Variant",
            Decoder::SpecialFloat => "SpecialFloat",
            Decoder::Keyword(_) => "Keyword",
        };
        f.write_str(kind)
    }
}

/// Pluggable fallback consulted for paths with no explicit registration.
pub trait TypeSource: Send + Sync {
    fn resolve(&self, path: &TypePath) -> Option<Decoder>;
}

#[derive(Clone, Default)]
pub struct TypeRegistry {
    decoders: BTreeMap<TypePath, Decoder>,
    sources: Vec<Arc<dyn TypeSource>>,
}

impl TypeRegistry {
    /// An empty registry; tagged dates and special floats will not resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with dates, times, timestamps and special floats.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register(temporal::date_path(), Decoder::keyword(temporal::date_from_fields))
            .register(temporal::time_path(), Decoder::keyword(temporal::time_from_fields))
            .register(
                temporal::timestamp_path(),
                Decoder::keyword(temporal::timestamp_from_fields),
            )
            .register(special::path(), Decoder::SpecialFloat);
        registry
    }

    pub fn register(&mut self, path: TypePath, decoder: Decoder) -> &mut Self {
        debug!(%path, ?decoder, "registered decoder");
        self.decoders.insert(path, decoder);
        self
    }

    pub fn register_record<T: Record>(&mut self) -> &mut Self {
        self.register(
            T::path(),
            Decoder::keyword(|fields| T::from_fields(fields).map(Datum::tagged)),
        )
    }

    pub fn register_custom<T: JsonRecord>(&mut self) -> &mut Self {
        self.register(
            T::path(),
            Decoder::custom(|fields| T::from_json(fields).map(Datum::tagged)),
        )
    }

    pub fn register_variants<T: VariantSet>(&mut self) -> &mut Self {
        self.register(
            T::path(),
            Decoder::variant(|name| T::variant(name).map(Datum::tagged)),
        )
    }

    /// Append a fallback source; earlier sources take precedence.
    pub fn attach(&mut self, source: Arc<dyn TypeSource>) -> &mut Self {
        self.sources.push(source);
        self
    }

    pub fn contains(&self, path: &TypePath) -> bool {
        self.decoders.contains_key(path)
    }

    pub fn resolve(&self, path: &TypePath) -> Result<Decoder, CodecError> {
        if let Some(decoder) = self.decoders.get(path) {
            return Ok(decoder.clone());
        }
        self.sources
            .iter()
            .find_map(|source| source.resolve(path))
            .ok_or_else(|| CodecError::unresolved(path))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("decoders", &self.decoders)
            .field("sources", &self.sources.len())
            .finish()
    }
}
