//! Type identity and the traits tagged values implement.
//!
//! Every value the encoder tags carries a [`TypePath`]: the namespace it was
//! defined in plus its local name. The same pair is written to the `$module`
//! and `$type` keys and is what the [`crate::TypeRegistry`] resolves when a
//! payload comes back.

use crate::datum::{Datum, Fields};
use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;

/// Two-part location of a type: originating namespace and local name.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TypePath {
    pub module: String,
    pub name: String,
}

impl TypePath {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Derive a path from the Rust type name (`crate::module::Type`).
    ///
    /// `std::any::type_name` is not guaranteed stable across compiler
    /// releases; types whose tags are persisted should spell their path out
    /// with [`TypePath::new`] and `module_path!()`. Only nominal types are
    /// split; tuples, arrays, slices and references keep their whole name.
    pub fn of<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        // Generic arguments may contain `::` themselves; split before them.
        let base_end = full.find(['<', '(', '[', '&', '*']).unwrap_or(full.len());
        match full[..base_end].rfind("::") {
            Some(idx) => Self::new(&full[..idx], &full[idx + 2..]),
            None => Self::new("", full),
        }
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.module, self.name)
        }
    }
}

/// How a tagged value wants to be encoded.
#[derive(Debug)]
pub enum Shape<'a> {
    /// Fully custom JSON object; replaces field-by-field encoding.
    Custom(Map<String, Value>),
    /// Named fields in declaration order.
    Record(Vec<(Cow<'a, str>, Datum)>),
    /// Member of a closed set of named constants.
    Variant { name: &'a str, payload: Datum },
}

/// A value that knows its own type path and encoding shape.
///
/// Implementors get cloning, downcasting and structural equality through the
/// blanket [`DynTagged`] impl as long as they are `Clone + PartialEq`.
pub trait Tagged: DynTagged + fmt::Debug + Send + Sync + 'static {
    fn type_path(&self) -> TypePath;

    fn shape(&self) -> Shape<'_>;
}

/// Object-safe plumbing for boxed [`Tagged`] values.
pub trait DynTagged {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn Tagged>;
    fn eq_dyn(&self, other: &dyn Tagged) -> bool;
}

impl<T> DynTagged for T
where
    T: Tagged + Clone + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn Tagged> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn Tagged) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
}

impl Clone for Box<dyn Tagged> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl PartialEq for dyn Tagged {
    fn eq(&self, other: &Self) -> bool {
        self.eq_dyn(other)
    }
}

/// Record types rebuilt by keyword from their decoded fields.
pub trait Record: Tagged + Sized {
    fn path() -> TypePath;

    fn from_fields(fields: Fields) -> Result<Self, FieldError>;
}

/// Types whose [`Shape::Custom`] output is reversed by their own parser.
///
/// `from_json` receives the decoded mapping with the tag removed and the keys
/// exactly as written; it is responsible for any key conversion itself.
pub trait JsonRecord: Tagged + Sized {
    fn path() -> TypePath;

    fn from_json(fields: Fields) -> Result<Self, FieldError>;
}

/// Closed sets of named constants, looked up by member name on decode.
pub trait VariantSet: Tagged + Sized {
    fn path() -> TypePath;

    fn variant(name: &str) -> Option<Self>;
}
