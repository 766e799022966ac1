//! Catalog documents: categories and members declared in JSON.
//!
//! ```json
//! {"categories": [{"name": "Unit", "namespace": "game::units",
//!   "fixed": ["unit_damage"], "mutable": ["state"],
//!   "members": [{"name": "Footman", "fixed": {"unit_damage": 1}}]}]}
//! ```
//!
//! Member values go through the codec, so they may hold tagged dates or
//! members of categories declared earlier in the same document.

use super::{Category, CategoryBuilder, MemberBuilder, StaticRegistry};
use crate::codec::decode;
use crate::config::CodecOptions;
use crate::resolver::{TypeRegistry, TypeSource};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CatalogDocument {
    pub categories: Vec<CategoryEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub fixed: Vec<String>,
    #[serde(default)]
    pub mutable: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MemberEntry {
    pub name: String,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub fixed: Map<String, Value>,
}

impl CatalogDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let document: CatalogDocument =
            serde_json::from_str(text).context("parsing catalog document")?;
        document.validate()?;
        Ok(document)
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            bail!("catalog document declares no categories");
        }
        for category in &self.categories {
            if category.name.trim().is_empty() {
                bail!("encountered category with no name");
            }
            if category.members.iter().any(|m| m.name.trim().is_empty()) {
                bail!("category {} has a member with no name", category.name);
            }
        }
        Ok(())
    }

    /// Define every category and member in `registry`, in document order.
    ///
    /// Fails on the first conflict; categories defined before the failure
    /// stay registered.
    pub fn apply(
        &self,
        registry: &Arc<StaticRegistry>,
        options: &CodecOptions,
    ) -> Result<Vec<Arc<Category>>> {
        let mut types = TypeRegistry::with_builtins();
        types.attach(Arc::clone(registry) as Arc<dyn TypeSource>);

        let mut defined = Vec::with_capacity(self.categories.len());
        for entry in &self.categories {
            let category = registry
                .define(entry.builder())
                .with_context(|| format!("defining category {}", entry.name))?;
            for member in &entry.members {
                let mut builder = MemberBuilder::new(&member.name);
                if let Some(info) = &member.info {
                    builder = builder.info(info);
                }
                for (field, raw) in &member.fixed {
                    let value = decode(raw, &types, options).with_context(|| {
                        format!("decoding {}.{}.{}", entry.name, member.name, field)
                    })?;
                    builder = builder.set(field, value);
                }
                category
                    .define(builder)
                    .with_context(|| format!("defining member {}.{}", entry.name, member.name))?;
            }
            debug!(category = %category, members = category.len(), "loaded catalog category");
            defined.push(category);
        }
        Ok(defined)
    }
}

impl CategoryEntry {
    fn builder(&self) -> CategoryBuilder {
        let mut builder = CategoryBuilder::new(&self.namespace, &self.name);
        if let Some(info) = &self.info {
            builder = builder.info(info);
        }
        for field in &self.fixed {
            builder = builder.fixed(field);
        }
        for field in &self.mutable {
            builder = builder.mutable(field);
        }
        builder
    }
}

/// Read a catalog document from disk and define it in `registry`.
pub fn load_catalog_from_path(
    path: &Path,
    registry: &Arc<StaticRegistry>,
    options: &CodecOptions,
) -> Result<Vec<Arc<Category>>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let document =
        CatalogDocument::parse(&text).with_context(|| format!("loading {}", path.display()))?;
    document.apply(registry, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use serde_json::json;

    fn sample() -> String {
        json!({"categories": [
            {"name": "Unit", "namespace": "game::units", "info": "Unit information.",
             "fixed": ["unit_damage", "fort_damage"], "mutable": ["state"],
             "members": [
                {"name": "Footman", "info": "A noble footman.",
                 "fixed": {"unit_damage": 1, "fort_damage": 1}},
                {"name": "Siege", "fixed": {"unit_damage": 0, "fort_damage": 4}}
             ]},
            {"name": "Terrain", "namespace": "game::terrain",
             "fixed": ["unit_constraint"],
             "members": [
                {"name": "Land", "fixed": {"unit_constraint": [
                    {"$module": "game::units", "$type": "Unit", "name": "Footman",
                     "unitDamage": 1, "fortDamage": 1}
                ]}}
             ]}
        ]})
        .to_string()
    }

    #[test]
    fn applies_categories_and_members_in_order() {
        let registry = Arc::new(StaticRegistry::new());
        let document = CatalogDocument::parse(&sample()).unwrap();
        let defined = document.apply(&registry, &CodecOptions::default()).unwrap();

        assert_eq!(defined.len(), 2);
        assert_eq!(registry.names(), vec!["Unit", "Terrain"]);
        let unit = registry.get("unit").unwrap();
        assert_eq!(unit.names(), vec!["Footman", "Siege"]);
        assert_eq!(unit.info(), "Unit information.");

        let footman = unit.get("Footman").unwrap();
        let land = registry.member("Terrain", "Land").unwrap();
        match land.fixed("unit_constraint") {
            Some(Datum::Seq(items)) => assert_eq!(items, &vec![Datum::Member(footman)]),
            other => panic!("expected member list, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_documents() {
        let err = CatalogDocument::parse(r#"{"categories": []}"#).unwrap_err();
        assert!(err.to_string().contains("no categories"));
    }

    #[test]
    fn conflicting_member_reports_context() {
        let registry = Arc::new(StaticRegistry::new());
        let text = json!({"categories": [{"name": "House", "fixed": ["words"], "members": [
            {"name": "Stark", "fixed": {"words": "Winter is Coming"}},
            {"name": "stark", "fixed": {"words": "Summer is Here"}}
        ]}]})
        .to_string();
        let err = CatalogDocument::parse(&text)
            .unwrap()
            .apply(&registry, &CodecOptions::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("defining member House.stark"));
    }
}
