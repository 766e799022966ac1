//! In-memory value model fed to the encoder and produced by the decoder.
//!
//! [`Datum`] is a closed set of value categories; the encoder dispatches on it
//! in a fixed precedence order. [`Fields`] and [`FromDatum`] are the helpers
//! keyword constructors use to pull typed fields out of a decoded mapping.

use crate::error::FieldError;
use crate::statics::{Instance, Member};
use crate::temporal::Timestamp;
use crate::types::Tagged;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A value the codec knows how to walk.
#[derive(Clone, Debug)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Datum>),
    Map(BTreeMap<String, Datum>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(Timestamp),
    /// Records, named variants and custom-encoded types.
    Tagged(Box<dyn Tagged>),
    /// A static catalog member (the definition itself).
    Member(Arc<Member>),
    /// A constructed instance of a static catalog member.
    Instance(Instance),
    /// A host value the codec has no category for.
    Foreign(Foreign),
}

/// Opaque host value carried through the codec untouched.
///
/// The encoder emits `raw` as-is and records a diagnostic; nothing checks that
/// `raw` is meaningful to a decoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Foreign {
    pub type_name: String,
    pub raw: Value,
}

impl Foreign {
    pub fn new(type_name: impl Into<String>, raw: Value) -> Self {
        Self {
            type_name: type_name.into(),
            raw,
        }
    }

    /// Capture any serde-serializable value with its Rust type name.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            std::any::type_name::<T>(),
            serde_json::to_value(value)?,
        ))
    }
}

impl Datum {
    pub fn tagged<T: Tagged>(value: T) -> Self {
        Datum::Tagged(Box::new(value))
    }

    /// Short category label used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Bool(_) => "bool",
            Datum::Int(_) => "integer",
            Datum::Float(_) => "float",
            Datum::Str(_) => "string",
            Datum::Seq(_) => "sequence",
            Datum::Map(_) => "mapping",
            Datum::Date(_) => "date",
            Datum::Time(_) => "time",
            Datum::Timestamp(_) => "timestamp",
            Datum::Tagged(_) => "tagged value",
            Datum::Member(_) => "static member",
            Datum::Instance(_) => "static instance",
            Datum::Foreign(_) => "foreign value",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Datum>> {
        match self {
            Datum::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the concrete type behind a [`Datum::Tagged`].
    pub fn downcast_ref<T: Tagged>(&self) -> Option<&T> {
        match self {
            Datum::Tagged(value) => value.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Equality that treats two NaNs as the same float.
    pub fn nan_eq(&self, other: &Datum) -> bool {
        match (self, other) {
            (Datum::Float(a), Datum::Float(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Datum::Seq(a), Datum::Seq(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.nan_eq(y))
            }
            (Datum::Map(a), Datum::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.nan_eq(vb))
            }
            _ => self == other,
        }
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Null, Datum::Null) => true,
            (Datum::Bool(a), Datum::Bool(b)) => a == b,
            (Datum::Int(a), Datum::Int(b)) => a == b,
            (Datum::Float(a), Datum::Float(b)) => a == b,
            (Datum::Str(a), Datum::Str(b)) => a == b,
            (Datum::Seq(a), Datum::Seq(b)) => a == b,
            (Datum::Map(a), Datum::Map(b)) => a == b,
            (Datum::Date(a), Datum::Date(b)) => a == b,
            (Datum::Time(a), Datum::Time(b)) => a == b,
            (Datum::Timestamp(a), Datum::Timestamp(b)) => a == b,
            (Datum::Tagged(a), Datum::Tagged(b)) => a.eq_dyn(&**b),
            (Datum::Member(a), Datum::Member(b)) => Arc::ptr_eq(a, b) || a == b,
            (Datum::Instance(a), Datum::Instance(b)) => a == b,
            (Datum::Foreign(a), Datum::Foreign(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Datum::Bool(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::Int(value)
    }
}

impl From<i32> for Datum {
    fn from(value: i32) -> Self {
        Datum::Int(value.into())
    }
}

impl From<u32> for Datum {
    fn from(value: u32) -> Self {
        Datum::Int(value.into())
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Float(value)
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::Str(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::Str(value.to_string())
    }
}

impl From<NaiveDate> for Datum {
    fn from(value: NaiveDate) -> Self {
        Datum::Date(value)
    }
}

impl From<NaiveTime> for Datum {
    fn from(value: NaiveTime) -> Self {
        Datum::Time(value)
    }
}

impl From<Timestamp> for Datum {
    fn from(value: Timestamp) -> Self {
        Datum::Timestamp(value)
    }
}

impl From<Arc<Member>> for Datum {
    fn from(value: Arc<Member>) -> Self {
        Datum::Member(value)
    }
}

impl From<Instance> for Datum {
    fn from(value: Instance) -> Self {
        Datum::Instance(value)
    }
}

impl From<Foreign> for Datum {
    fn from(value: Foreign) -> Self {
        Datum::Foreign(value)
    }
}

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(value: Option<T>) -> Self {
        value.map_or(Datum::Null, Into::into)
    }
}

impl<T: Into<Datum>> From<Vec<T>> for Datum {
    fn from(value: Vec<T>) -> Self {
        Datum::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Datum>> From<BTreeMap<String, T>> for Datum {
    fn from(value: BTreeMap<String, T>) -> Self {
        Datum::Map(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Conversion out of a decoded [`Datum`]; `None` means the category did not fit.
pub trait FromDatum: Sized {
    const EXPECTED: &'static str;

    fn from_datum(datum: Datum) -> Option<Self>;
}

impl FromDatum for Datum {
    const EXPECTED: &'static str = "any value";

    fn from_datum(datum: Datum) -> Option<Self> {
        Some(datum)
    }
}

impl FromDatum for bool {
    const EXPECTED: &'static str = "bool";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Bool(value) => Some(value),
            _ => None,
        }
    }
}

impl FromDatum for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Int(value) => Some(value),
            _ => None,
        }
    }
}

impl FromDatum for i32 {
    const EXPECTED: &'static str = "32-bit integer";

    fn from_datum(datum: Datum) -> Option<Self> {
        i64::from_datum(datum).and_then(|value| i32::try_from(value).ok())
    }
}

impl FromDatum for u32 {
    const EXPECTED: &'static str = "unsigned 32-bit integer";

    fn from_datum(datum: Datum) -> Option<Self> {
        i64::from_datum(datum).and_then(|value| u32::try_from(value).ok())
    }
}

impl FromDatum for f64 {
    const EXPECTED: &'static str = "float";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Float(value) => Some(value),
            Datum::Int(value) => Some(value as f64),
            _ => None,
        }
    }
}

impl FromDatum for String {
    const EXPECTED: &'static str = "string";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl FromDatum for NaiveDate {
    const EXPECTED: &'static str = "date";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Date(value) => Some(value),
            _ => None,
        }
    }
}

impl FromDatum for NaiveTime {
    const EXPECTED: &'static str = "time";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Time(value) => Some(value),
            _ => None,
        }
    }
}

impl FromDatum for Timestamp {
    const EXPECTED: &'static str = "timestamp";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Timestamp(value) => Some(value),
            _ => None,
        }
    }
}

impl FromDatum for Arc<Member> {
    const EXPECTED: &'static str = "static member";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Member(value) => Some(value),
            _ => None,
        }
    }
}

impl FromDatum for Instance {
    const EXPECTED: &'static str = "static instance";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Instance(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: FromDatum> FromDatum for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Null => Some(None),
            other => T::from_datum(other).map(Some),
        }
    }
}

impl<T: FromDatum> FromDatum for Vec<T> {
    const EXPECTED: &'static str = "sequence";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Seq(items) => items.into_iter().map(T::from_datum).collect(),
            _ => None,
        }
    }
}

impl<T: FromDatum> FromDatum for BTreeMap<String, T> {
    const EXPECTED: &'static str = "mapping";

    fn from_datum(datum: Datum) -> Option<Self> {
        match datum {
            Datum::Map(map) => map
                .into_iter()
                .map(|(k, v)| T::from_datum(v).map(|v| (k, v)))
                .collect(),
            _ => None,
        }
    }
}

/// Decoded fields of a tagged mapping, consumed by keyword constructors.
///
/// Constructors `take` each declared field and call [`Fields::finish`] so
/// leftovers surface as [`FieldError::Unexpected`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields {
    entries: BTreeMap<String, Datum>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Datum>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Builder-style [`Fields::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Datum>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Datum> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Datum> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove a required field and convert it.
    pub fn take<T: FromDatum>(&mut self, name: &str) -> Result<T, FieldError> {
        let datum = self
            .entries
            .remove(name)
            .ok_or_else(|| FieldError::Missing(name.to_string()))?;
        convert(name, datum)
    }

    /// Remove an optional field; absence yields `None`.
    pub fn take_opt<T: FromDatum>(&mut self, name: &str) -> Result<Option<T>, FieldError> {
        match self.entries.remove(name) {
            Some(datum) => convert(name, datum).map(Some),
            None => Ok(None),
        }
    }

    /// Remove a required field holding a concrete tagged type.
    pub fn take_tagged<T: Tagged + Clone>(&mut self, name: &str) -> Result<T, FieldError> {
        let datum = self
            .entries
            .remove(name)
            .ok_or_else(|| FieldError::Missing(name.to_string()))?;
        let found = datum.kind();
        datum
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| FieldError::WrongType {
                field: name.to_string(),
                expected: "tagged value",
                found,
            })
    }

    /// Fail when any field was left unconsumed.
    pub fn finish(self) -> Result<(), FieldError> {
        if self.entries.is_empty() {
            Ok(())
        } else {
            Err(FieldError::Unexpected(self.entries.into_keys().collect()))
        }
    }

    pub fn into_map(self) -> BTreeMap<String, Datum> {
        self.entries
    }
}

impl From<BTreeMap<String, Datum>> for Fields {
    fn from(entries: BTreeMap<String, Datum>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, Datum)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Datum)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn convert<T: FromDatum>(name: &str, datum: Datum) -> Result<T, FieldError> {
    let found = datum.kind();
    T::from_datum(datum).ok_or_else(|| FieldError::WrongType {
        field: name.to_string(),
        expected: T::EXPECTED,
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_reports_missing_and_wrong_type() {
        let mut fields = Fields::new().with("count", 3).with("label", 4);
        assert_eq!(fields.take::<i64>("count").unwrap(), 3);
        match fields.take::<String>("label") {
            Err(FieldError::WrongType {
                field,
                expected,
                found,
            }) => {
                assert_eq!(field, "label");
                assert_eq!(expected, "string");
                assert_eq!(found, "integer");
            }
            other => panic!("expected wrong type error, got {other:?}"),
        }
        assert!(matches!(
            fields.take::<bool>("missing"),
            Err(FieldError::Missing(name)) if name == "missing"
        ));
    }

    #[test]
    fn finish_lists_leftover_fields() {
        let mut fields = Fields::new().with("a", 1).with("b", 2).with("c", 3);
        let _: i64 = fields.take("a").unwrap();
        match fields.finish() {
            Err(FieldError::Unexpected(names)) => assert_eq!(names, vec!["b", "c"]),
            other => panic!("expected unexpected fields, got {other:?}"),
        }
    }

    #[test]
    fn optional_and_nested_conversions() {
        let mut fields = Fields::new()
            .with("maybe", Datum::Null)
            .with("list", vec![1.5, 2.0])
            .with("whole", 2);
        assert_eq!(fields.take::<Option<String>>("maybe").unwrap(), None);
        assert_eq!(fields.take::<Vec<f64>>("list").unwrap(), vec![1.5, 2.0]);
        assert_eq!(fields.take::<f64>("whole").unwrap(), 2.0);
        assert_eq!(fields.take_opt::<i64>("absent").unwrap(), None);
        assert!(fields.finish().is_ok());
    }

    #[test]
    fn nan_eq_treats_nan_as_equal() {
        let a = Datum::Seq(vec![Datum::Float(f64::NAN), Datum::Int(1)]);
        let b = Datum::Seq(vec![Datum::Float(f64::NAN), Datum::Int(1)]);
        assert_ne!(a, b);
        assert!(a.nan_eq(&b));
    }
}
