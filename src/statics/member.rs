//! Catalog members and the instances built from them.
//!
//! A member holds the fixed half of its category's fields and is shared
//! behind an `Arc`; an [`Instance`] owns the mutable half. Fixed fields are
//! only reachable through read accessors, so write protection is a matter of
//! [`Instance::set`] refusing them.

use super::category::{Blueprint, describe};
use super::error::StaticError;
use crate::datum::{Datum, Fields};
use crate::types::TypePath;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name, description and fixed values of a member before registration.
#[derive(Clone, Debug, Default)]
pub struct MemberBuilder {
    pub(crate) name: String,
    info: Option<String>,
    pub(crate) fixed: BTreeMap<String, Datum>,
}

impl MemberBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn info(mut self, doc: impl Into<String>) -> Self {
        self.info = Some(doc.into());
        self
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Datum>) -> Self {
        self.fixed.insert(field.into(), value.into());
        self
    }

    pub fn fields(mut self, fields: Fields) -> Self {
        self.fixed.extend(fields.into_map());
        self
    }

    pub(crate) fn finish(self, blueprint: Arc<Blueprint>) -> Member {
        let info = match &self.info {
            Some(doc) => describe(doc),
            None => format!("{}({})", self.name, blueprint.mutable.join(", ")),
        };
        Member {
            blueprint,
            name: self.name,
            info,
            fixed: self.fixed,
        }
    }
}

/// A named, registered member of a category.
#[derive(Debug, PartialEq)]
pub struct Member {
    blueprint: Arc<Blueprint>,
    name: String,
    info: String,
    fixed: BTreeMap<String, Datum>,
}

impl Member {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn category_name(&self) -> &str {
        &self.blueprint.path.name
    }

    /// Tag written when the member itself is encoded.
    pub fn category_path(&self) -> &TypePath {
        &self.blueprint.path
    }

    /// Tag written for instances of this member.
    pub fn path(&self) -> TypePath {
        TypePath::new(self.blueprint.member_module(), &self.name)
    }

    pub fn fixed(&self, field: &str) -> Option<&Datum> {
        self.fixed.get(field)
    }

    /// Fixed values in the category's declared order.
    pub fn fixed_fields(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.blueprint
            .fixed
            .iter()
            .filter_map(|field| self.fixed.get(field).map(|value| (field.as_str(), value)))
    }

    pub fn mutable_fields(&self) -> &[String] {
        &self.blueprint.mutable
    }

    pub(crate) fn fixed_values(&self) -> &BTreeMap<String, Datum> {
        &self.fixed
    }

    /// Build an instance from exactly the category's mutable fields.
    pub fn instantiate(self: &Arc<Self>, fields: Fields) -> Result<Instance, StaticError> {
        let values = fields.into_map();
        let missing: Vec<String> = self
            .blueprint
            .mutable
            .iter()
            .filter(|field| !values.contains_key(*field))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(StaticError::ExpectedAttribute {
                name: self.to_string(),
                attrs: missing,
            });
        }
        let unexpected: Vec<String> = values
            .keys()
            .filter(|field| !self.blueprint.mutable.contains(*field))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(StaticError::UnexpectedAttribute {
                name: self.to_string(),
                attrs: unexpected,
            });
        }
        Ok(Instance {
            member: Arc::clone(self),
            values,
        })
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.blueprint.path.name, self.name)
    }
}

/// A member plus its own values for the mutable fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    member: Arc<Member>,
    values: BTreeMap<String, Datum>,
}

impl Instance {
    pub fn member(&self) -> &Arc<Member> {
        &self.member
    }

    /// Read a mutable or fixed field.
    pub fn get(&self, field: &str) -> Option<&Datum> {
        self.values
            .get(field)
            .or_else(|| self.member.fixed(field))
    }

    /// Overwrite a mutable field; fixed fields are frozen.
    pub fn set(&mut self, field: &str, value: impl Into<Datum>) -> Result<(), StaticError> {
        if let Some(slot) = self.values.get_mut(field) {
            *slot = value.into();
            return Ok(());
        }
        let err = if self.member.fixed(field).is_some() {
            StaticError::FrozenAttribute {
                member: self.member.to_string(),
                field: field.to_string(),
            }
        } else {
            StaticError::UnknownAttribute {
                member: self.member.to_string(),
                field: field.to_string(),
            }
        };
        Err(err)
    }

    /// Mutable values in the category's declared order.
    pub fn mutable_fields(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.member
            .blueprint
            .mutable
            .iter()
            .filter_map(|field| self.values.get(field).map(|value| (field.as_str(), value)))
    }
}
