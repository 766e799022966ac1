#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use heraldry::{
    CategoryBuilder, Datum, FieldError, Fields, JsonRecord, MemberBuilder, Record, Shape,
    StaticRegistry, Tagged, TypePath, TypeRegistry, TypeSource, VariantSet,
};
use serde_json::{Map, Value, json};
use std::borrow::Cow;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const MODULE: &str = "tests::support";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnitState {
    Ready,
    Retreating,
    OffBoard,
}

impl UnitState {
    fn name(self) -> &'static str {
        match self {
            UnitState::Ready => "READY",
            UnitState::Retreating => "RETREATING",
            UnitState::OffBoard => "OFF_BOARD",
        }
    }

    fn label(self) -> &'static str {
        match self {
            UnitState::Ready => "Ready",
            UnitState::Retreating => "Retreating",
            UnitState::OffBoard => "Off Board",
        }
    }
}

impl Tagged for UnitState {
    fn type_path(&self) -> TypePath {
        <Self as VariantSet>::path()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Variant {
            name: self.name(),
            payload: self.label().into(),
        }
    }
}

impl VariantSet for UnitState {
    fn path() -> TypePath {
        TypePath::new(MODULE, "UnitState")
    }

    fn variant(name: &str) -> Option<Self> {
        [UnitState::Ready, UnitState::Retreating, UnitState::OffBoard]
            .into_iter()
            .find(|state| state.name() == name)
    }
}

/// Record exercising nested tagged fields, optionals and dates.
#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    pub house_name: String,
    pub sigil: Option<String>,
    pub raised_on: NaiveDate,
    pub strength: f64,
    pub state: UnitState,
}

impl Banner {
    pub fn sample() -> Self {
        Self {
            house_name: "Stark".into(),
            sigil: Some("Direwolf".into()),
            raised_on: NaiveDate::from_ymd_opt(298, 7, 14).unwrap(),
            strength: 0.75,
            state: UnitState::Retreating,
        }
    }
}

impl Tagged for Banner {
    fn type_path(&self) -> TypePath {
        <Self as Record>::path()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Record(vec![
            (Cow::Borrowed("house_name"), self.house_name.as_str().into()),
            (Cow::Borrowed("sigil"), self.sigil.clone().into()),
            (Cow::Borrowed("raised_on"), self.raised_on.into()),
            (Cow::Borrowed("strength"), self.strength.into()),
            (Cow::Borrowed("state"), Datum::tagged(self.state)),
        ])
    }
}

impl Record for Banner {
    fn path() -> TypePath {
        TypePath::new(MODULE, "Banner")
    }

    fn from_fields(mut fields: Fields) -> Result<Self, FieldError> {
        let banner = Banner {
            house_name: fields.take("house_name")?,
            sigil: fields.take("sigil")?,
            raised_on: fields.take("raised_on")?,
            strength: fields.take("strength")?,
            state: fields.take_tagged("state")?,
        };
        fields.finish()?;
        Ok(banner)
    }
}

/// Type with its own wire form: one `latLon` pair instead of two fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Tagged for Coordinates {
    fn type_path(&self) -> TypePath {
        <Self as JsonRecord>::path()
    }

    fn shape(&self) -> Shape<'_> {
        let mut map = Map::new();
        map.insert("latLon".into(), json!([self.lat, self.lon]));
        Shape::Custom(map)
    }
}

impl JsonRecord for Coordinates {
    fn path() -> TypePath {
        TypePath::new(MODULE, "Coordinates")
    }

    fn from_json(mut fields: Fields) -> Result<Self, FieldError> {
        let pair: Vec<f64> = fields.take("latLon")?;
        fields.finish()?;
        match pair.as_slice() {
            [lat, lon] => Ok(Coordinates {
                lat: *lat,
                lon: *lon,
            }),
            _ => Err(FieldError::invalid("latLon", "expected two numbers")),
        }
    }
}

/// Builtins plus every test type.
pub fn test_types() -> TypeRegistry {
    let mut types = TypeRegistry::with_builtins();
    types
        .register_record::<Banner>()
        .register_custom::<Coordinates>()
        .register_variants::<UnitState>();
    types
}

/// Fresh catalog with a `Unit` category and the four classic units.
pub fn unit_catalog() -> Arc<StaticRegistry> {
    let registry = Arc::new(StaticRegistry::new());
    let unit = registry
        .define(
            CategoryBuilder::new("game::units", "Unit")
                .info("Unit information.")
                .fixed("unit_damage")
                .fixed("fort_damage")
                .mutable("state"),
        )
        .unwrap();
    for (name, unit_damage, fort_damage) in [
        ("Footman", 1, 1),
        ("Knight", 2, 2),
        ("Ship", 1, 1),
        ("Siege", 0, 4),
    ] {
        unit.define(
            MemberBuilder::new(name)
                .set("unit_damage", unit_damage)
                .set("fort_damage", fort_damage),
        )
        .unwrap();
    }
    registry
}

pub fn types_with(catalog: &Arc<StaticRegistry>) -> TypeRegistry {
    let mut types = test_types();
    types.attach(Arc::clone(catalog) as Arc<dyn TypeSource>);
    types
}

pub fn write_temp_json(value: &Value) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.flush()?;
    Ok(file)
}
