//! Top-level table of categories.
//!
//! The registry is also a [`TypeSource`]: attach it to a
//! [`TypeRegistry`](crate::TypeRegistry) and tagged payloads naming a
//! category decode to members, while payloads naming a member decode to
//! instances.

use super::category::{Category, CategoryBuilder};
use super::error::StaticError;
use super::member::Member;
use super::table::Table;
use crate::datum::Datum;
use crate::resolver::{Decoder, TypeSource};
use crate::types::TypePath;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard};
use tracing::info;

#[derive(Debug, Default)]
pub struct StaticRegistry {
    categories: RwLock<Table<Category>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry for callers that want a single shared catalog.
    pub fn global() -> Arc<StaticRegistry> {
        static GLOBAL: OnceLock<Arc<StaticRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(StaticRegistry::new())))
    }

    /// Register a new category.
    ///
    /// Any existing category with the same name under case folding is a
    /// conflict, whatever its fields.
    pub fn define(&self, builder: CategoryBuilder) -> Result<Arc<Category>, StaticError> {
        let mut table = self
            .categories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = table.get(builder.name()) {
            return Err(StaticError::TypeConflict {
                name: builder.name().to_string(),
                existing: existing.to_string(),
            });
        }
        let category = Arc::new(builder.build()?);
        table.insert(category.name(), Arc::clone(&category));
        info!(category = %category, "registered static category");
        Ok(category)
    }

    /// Case-insensitive category lookup.
    pub fn get(&self, name: &str) -> Option<Arc<Category>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains(name)
    }

    /// Shortcut for `get(category)?.get(member)`.
    pub fn member(&self, category: &str, member: &str) -> Option<Arc<Member>> {
        self.get(category)?.get(member)
    }

    /// Categories in registration order.
    pub fn categories(&self) -> Vec<Arc<Category>> {
        self.read().iter().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.read()
            .iter()
            .map(|category| category.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Table<Category>> {
        self.categories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn category_at(&self, namespace: &str, name: &str) -> Option<Arc<Category>> {
        self.get(name)
            .filter(|category| category.namespace() == namespace)
    }
}

impl TypeSource for StaticRegistry {
    fn resolve(&self, path: &TypePath) -> Option<Decoder> {
        if let Some(category) = self.category_at(&path.module, &path.name) {
            return Some(Decoder::keyword(move |mut fields| {
                let name: String = fields.take("name")?;
                Ok(Datum::Member(category.member_from(&name, fields)?))
            }));
        }

        let (namespace, category_name) = path
            .module
            .rsplit_once("::")
            .unwrap_or(("", path.module.as_str()));
        let member = self.category_at(namespace, category_name)?.get(&path.name)?;
        Some(Decoder::keyword(move |fields| {
            Ok(Datum::Instance(member.instantiate(fields)?))
        }))
    }
}
