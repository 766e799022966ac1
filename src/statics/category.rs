//! Category definitions and their member tables.

use super::error::StaticError;
use super::member::{Member, MemberBuilder};
use super::table::Table;
use crate::codec::{MODULE_KEY, TYPE_KEY};
use crate::datum::{Datum, Fields};
use crate::types::TypePath;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Field layout shared by a category and every member created from it.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Blueprint {
    pub(crate) path: TypePath,
    pub(crate) fixed: Vec<String>,
    pub(crate) mutable: Vec<String>,
}

impl Blueprint {
    /// Module written into the tag of instances built from a member.
    pub(crate) fn member_module(&self) -> String {
        if self.path.module.is_empty() {
            self.path.name.clone()
        } else {
            format!("{}::{}", self.path.module, self.path.name)
        }
    }
}

/// Declares a category: its name, namespace, description and fields.
///
/// Fields marked fixed are supplied once per member; everything else is
/// supplied per instance.
#[derive(Clone, Debug)]
pub struct CategoryBuilder {
    namespace: String,
    name: String,
    info: Option<String>,
    fixed: Vec<String>,
    mutable: Vec<String>,
}

impl CategoryBuilder {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            info: None,
            fixed: Vec::new(),
            mutable: Vec::new(),
        }
    }

    pub fn info(mut self, doc: impl Into<String>) -> Self {
        self.info = Some(doc.into());
        self
    }

    pub fn fixed(mut self, field: impl Into<String>) -> Self {
        self.fixed.push(field.into());
        self
    }

    pub fn mutable(mut self, field: impl Into<String>) -> Self {
        self.mutable.push(field.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn build(self) -> Result<Category, StaticError> {
        let mut seen = BTreeSet::new();
        for field in self.fixed.iter().chain(&self.mutable) {
            let reason = if field == MODULE_KEY || field == TYPE_KEY {
                Some("reserved for type tags")
            } else if field == "name" {
                Some("reserved for the member name")
            } else if !is_identifier(field) {
                Some("not an identifier")
            } else if !seen.insert(field.as_str()) {
                Some("declared twice")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(StaticError::InvalidField {
                    category: self.name.clone(),
                    field: field.clone(),
                    reason,
                });
            }
        }

        let info = match &self.info {
            Some(doc) => describe(doc),
            None => {
                let params: Vec<&str> = std::iter::once("name")
                    .chain(self.fixed.iter().map(String::as_str))
                    .collect();
                format!("{}({})", self.name, params.join(", "))
            }
        };
        Ok(Category {
            blueprint: Arc::new(Blueprint {
                path: TypePath::new(self.namespace, self.name),
                fixed: self.fixed,
                mutable: self.mutable,
            }),
            info,
            members: RwLock::default(),
        })
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A registered category and the members defined under it.
#[derive(Debug)]
pub struct Category {
    blueprint: Arc<Blueprint>,
    info: String,
    members: RwLock<Table<Member>>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.blueprint.path.name
    }

    pub fn namespace(&self) -> &str {
        &self.blueprint.path.module
    }

    /// Tag written for members of this category.
    pub fn path(&self) -> &TypePath {
        &self.blueprint.path
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn fixed_fields(&self) -> &[String] {
        &self.blueprint.fixed
    }

    pub fn mutable_fields(&self) -> &[String] {
        &self.blueprint.mutable
    }

    /// Register a member, or return the existing one when a member with the
    /// same name (any case) already holds identical fixed values.
    pub fn define(&self, builder: MemberBuilder) -> Result<Arc<Member>, StaticError> {
        let mut table = self.members.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = table.get(&builder.name) {
            if same_values(existing.fixed_values(), &builder.fixed) {
                debug!(member = %existing, "reusing identical static member");
                return Ok(Arc::clone(existing));
            }
            return Err(StaticError::InstanceConflict {
                name: builder.name,
                existing: existing.to_string(),
            });
        }

        let missing: Vec<String> = self
            .blueprint
            .fixed
            .iter()
            .filter(|field| !builder.fixed.contains_key(*field))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(StaticError::ExpectedAttribute {
                name: builder.name,
                attrs: missing,
            });
        }
        let unexpected: Vec<String> = builder
            .fixed
            .keys()
            .filter(|field| !self.blueprint.fixed.contains(*field))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(StaticError::UnexpectedAttribute {
                name: builder.name,
                attrs: unexpected,
            });
        }

        let member = Arc::new(builder.finish(Arc::clone(&self.blueprint)));
        table.insert(member.name(), Arc::clone(&member));
        info!(member = %member, "registered static member");
        Ok(member)
    }

    /// Dynamic member creation from decoded keyword fields.
    pub fn member_from(&self, name: &str, fields: Fields) -> Result<Arc<Member>, StaticError> {
        self.define(MemberBuilder::new(name).fields(fields))
    }

    /// Case-insensitive member lookup.
    pub fn get(&self, name: &str) -> Option<Arc<Member>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains(name)
    }

    /// Whether this exact member definition is registered here.
    pub fn contains_member(&self, member: &Member) -> bool {
        self.read().iter().any(|entry| **entry == *member)
    }

    /// Members in registration order.
    pub fn members(&self) -> Vec<Arc<Member>> {
        self.read().iter().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.read()
            .iter()
            .map(|member| member.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Table<Member>> {
        self.members.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.blueprint.path)
    }
}

/// Turn a docstring-style description into `info`: drop the summary line when
/// more lines follow, strip common indentation, trim.
pub(crate) fn describe(doc: &str) -> String {
    let doc = doc.trim_start();
    let body = doc.split_once('\n').map_or(doc, |(_, rest)| rest);
    dedent(body).trim().to_string()
}

fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let indent = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => {
                let common = current
                    .bytes()
                    .zip(indent.bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                &current[..common]
            }
        });
    }
    let margin = margin.unwrap_or("");
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fixed values match when keys agree and every value is equal, NaN included.
fn same_values(a: &BTreeMap<String, Datum>, b: &BTreeMap<String, Datum>) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|((ka, va), (kb, vb))| ka == kb && va.nan_eq(vb))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Category {
        CategoryBuilder::new("game::units", "Unit")
            .info("Unit information.")
            .fixed("unit_damage")
            .fixed("fort_damage")
            .mutable("state")
            .build()
            .unwrap()
    }

    #[test]
    fn describe_drops_summary_and_dedents() {
        let doc = "Summary line.\n\n    First detail.\n      Indented more.\n    ";
        assert_eq!(describe(doc), "First detail.\n  Indented more.");
        assert_eq!(describe("  Only a summary."), "Only a summary.");
    }

    #[test]
    fn dedent_strips_only_a_shared_whitespace_prefix() {
        assert_eq!(dedent("\tone\n    two"), "\tone\n    two");
        assert_eq!(dedent("  \tone\n\n  two"), "\tone\n\ntwo");
        assert_eq!(dedent("    one\n      two"), "one\n  two");
    }

    #[test]
    fn default_info_lists_constructor_fields() {
        let category = CategoryBuilder::new("", "House")
            .fixed("words")
            .build()
            .unwrap();
        assert_eq!(category.info(), "House(name, words)");
    }

    #[test]
    fn invalid_field_names_are_rejected() {
        for (field, reason) in [
            ("name", "reserved for the member name"),
            ("$type", "reserved for type tags"),
            ("has space", "not an identifier"),
            ("9lives", "not an identifier"),
        ] {
            let err = CategoryBuilder::new("ns", "Cat")
                .fixed(field)
                .build()
                .unwrap_err();
            assert_eq!(
                err,
                StaticError::InvalidField {
                    category: "Cat".into(),
                    field: field.into(),
                    reason,
                }
            );
        }
        let err = CategoryBuilder::new("ns", "Cat")
            .fixed("a")
            .mutable("a")
            .build()
            .unwrap_err();
        assert!(matches!(err, StaticError::InvalidField { reason: "declared twice", .. }));
    }

    #[test]
    fn member_field_checks() {
        let category = unit();
        let err = category
            .define(MemberBuilder::new("Bad").set("unit_damage", 1))
            .unwrap_err();
        assert_eq!(
            err,
            StaticError::ExpectedAttribute {
                name: "Bad".into(),
                attrs: vec!["fort_damage".into()],
            }
        );

        let err = category
            .define(
                MemberBuilder::new("Bad")
                    .set("unit_damage", 1)
                    .set("fort_damage", 1)
                    .set("state", "Ready"),
            )
            .unwrap_err();
        assert_eq!(
            err,
            StaticError::UnexpectedAttribute {
                name: "Bad".into(),
                attrs: vec!["state".into()],
            }
        );
        assert!(category.is_empty());
    }

    #[test]
    fn define_is_idempotent_for_identical_values() {
        let category = unit();
        let footman = category
            .member_from(
                "Footman",
                Fields::new().with("unit_damage", 1).with("fort_damage", 1),
            )
            .unwrap();
        let again = category
            .member_from(
                "FOOTMAN",
                Fields::new().with("unit_damage", 1).with("fort_damage", 1),
            )
            .unwrap();
        assert!(Arc::ptr_eq(&footman, &again));

        let err = category
            .member_from(
                "footman",
                Fields::new().with("unit_damage", 2).with("fort_damage", 1),
            )
            .unwrap_err();
        assert!(matches!(err, StaticError::InstanceConflict { .. }));
        assert_eq!(category.len(), 1);
        assert_eq!(footman.fixed("unit_damage"), Some(&Datum::Int(1)));
    }

    #[test]
    fn define_is_idempotent_for_nan_values() {
        let gauge = CategoryBuilder::new("game::gauges", "Gauge")
            .fixed("reading")
            .build()
            .unwrap();
        let broken = gauge
            .member_from("Broken", Fields::new().with("reading", f64::NAN))
            .unwrap();
        let again = gauge
            .member_from("Broken", Fields::new().with("reading", f64::NAN))
            .unwrap();
        assert!(Arc::ptr_eq(&broken, &again));
        assert!(matches!(
            gauge.member_from("Broken", Fields::new().with("reading", 0.0)),
            Err(StaticError::InstanceConflict { .. })
        ));
    }

    #[test]
    fn members_enumerate_in_registration_order() {
        let category = unit();
        for name in ["Siege", "Footman", "Knight"] {
            category
                .member_from(
                    name,
                    Fields::new().with("unit_damage", 0).with("fort_damage", 0),
                )
                .unwrap();
        }
        assert_eq!(category.names(), vec!["Siege", "Footman", "Knight"]);
        let knight = category.get("knight").unwrap();
        assert!(category.contains_member(&knight));
        assert!(category.contains("SIEGE"));
    }
}
