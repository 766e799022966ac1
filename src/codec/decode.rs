use super::{MODULE_KEY, TYPE_KEY};
use crate::case::snake_case;
use crate::config::CodecOptions;
use crate::datum::{Datum, Fields};
use crate::error::CodecError;
use crate::resolver::TypeRegistry;
use crate::types::TypePath;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Rebuild a value from its wire form.
///
/// The tag alone decides how a mapping is rebuilt; with no complete tag it
/// stays a plain mapping. A lone `$module` or `$type` key is dropped.
pub fn decode(
    value: &Value,
    registry: &TypeRegistry,
    options: &CodecOptions,
) -> Result<Datum, CodecError> {
    match value {
        Value::Null => Ok(Datum::Null),
        Value::Bool(value) => Ok(Datum::Bool(*value)),
        Value::Number(number) => Ok(decode_number(number)),
        Value::String(value) => Ok(Datum::Str(value.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| decode(item, registry, options))
            .collect::<Result<Vec<_>, _>>()
            .map(Datum::Seq),
        Value::Object(map) => decode_object(map, registry, options),
    }
}

fn decode_number(number: &Number) -> Datum {
    match number.as_i64() {
        Some(value) => Datum::Int(value),
        None => number.as_f64().map_or(Datum::Null, Datum::Float),
    }
}

fn decode_object(
    map: &Map<String, Value>,
    registry: &TypeRegistry,
    options: &CodecOptions,
) -> Result<Datum, CodecError> {
    let mut entries = BTreeMap::new();
    for (key, value) in map {
        entries.insert(key.clone(), decode(value, registry, options)?);
    }
    let module = entries.remove(MODULE_KEY);
    let name = entries.remove(TYPE_KEY);

    let (Some(module), Some(name)) = (module, name) else {
        let entries = if options.camel_case_keys {
            snake_keys(entries)?
        } else {
            entries
        };
        return Ok(Datum::Map(entries));
    };

    let path = tag_path(module, name)?;
    let decoder = registry.resolve(&path)?;
    let fields = if options.camel_case_keys && decoder.wants_snake_keys() {
        snake_keys(entries)?
    } else {
        entries
    };
    decoder
        .build(Fields::from(fields))
        .map_err(|source| CodecError::Argument { path, source })
}

fn snake_keys(entries: BTreeMap<String, Datum>) -> Result<BTreeMap<String, Datum>, CodecError> {
    entries
        .into_iter()
        .map(|(key, value)| Ok((snake_case(&key)?, value)))
        .collect()
}

fn tag_path(module: Datum, name: Datum) -> Result<TypePath, CodecError> {
    match (module, name) {
        (Datum::Str(module), Datum::Str(name)) => Ok(TypePath::new(module, name)),
        (module, name) => Err(CodecError::TypeResolution {
            module: tag_text(&module),
            name: tag_text(&name),
        }),
    }
}

fn tag_text(datum: &Datum) -> String {
    match datum {
        Datum::Str(text) => text.clone(),
        other => format!("<{}>", other.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::resolver::Decoder;
    use serde_json::json;

    fn builtins() -> TypeRegistry {
        TypeRegistry::with_builtins()
    }

    #[test]
    fn scalars_and_sequences_pass_through() {
        let value = json!([null, true, 3, 1.5, "s", u64::MAX]);
        let decoded = decode(&value, &builtins(), &CodecOptions::default()).unwrap();
        assert_eq!(
            decoded,
            Datum::Seq(vec![
                Datum::Null,
                Datum::Bool(true),
                Datum::Int(3),
                Datum::Float(1.5),
                Datum::from("s"),
                Datum::Float(u64::MAX as f64),
            ])
        );
    }

    #[test]
    fn camel_keys_are_snake_cased_in_plain_mappings() {
        let value = json!({"someReally": {"quiteNested": "thing"}});
        let decoded = decode(&value, &builtins(), &CodecOptions::default()).unwrap();
        let mut inner = BTreeMap::new();
        inner.insert("quite_nested".to_string(), Datum::from("thing"));
        let mut outer = BTreeMap::new();
        outer.insert("some_really".to_string(), Datum::Map(inner));
        assert_eq!(decoded, Datum::Map(outer));

        let raw = decode(&value, &builtins(), &CodecOptions::default().snake_keys()).unwrap();
        assert!(raw.as_map().unwrap().contains_key("someReally"));
    }

    #[test]
    fn lone_reserved_key_is_dropped() {
        let value = json!({"$module": "somewhere", "kept": 1});
        let decoded = decode(&value, &builtins(), &CodecOptions::default()).unwrap();
        let map = decoded.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["kept"], Datum::Int(1));
    }

    #[test]
    fn unknown_and_malformed_tags_fail_to_resolve() {
        let value = json!({"$module": "nowhere", "$type": "Ghost"});
        assert!(matches!(
            decode(&value, &builtins(), &CodecOptions::default()),
            Err(CodecError::TypeResolution { module, name }) if module == "nowhere" && name == "Ghost"
        ));

        let value = json!({"$module": 4, "$type": "Ghost"});
        assert!(matches!(
            decode(&value, &builtins(), &CodecOptions::default()),
            Err(CodecError::TypeResolution { module, .. }) if module == "<integer>"
        ));
    }

    #[test]
    fn construction_failures_wrap_the_field_error() {
        let value = json!({"$module": "heraldry::temporal", "$type": "Date",
                           "year": 2020, "month": 2});
        match decode(&value, &builtins(), &CodecOptions::default()) {
            Err(CodecError::Argument { path, source }) => {
                assert_eq!(path.name, "Date");
                assert!(matches!(source, FieldError::Missing(field) if field == "day"));
            }
            other => panic!("expected argument error, got {other:?}"),
        }
    }

    #[test]
    fn custom_decoders_see_raw_keys() {
        let mut registry = builtins();
        registry.register(
            TypePath::new("tests", "Raw"),
            Decoder::custom(|fields| Ok(Datum::Seq(fields.keys().map(Datum::from).collect()))),
        );
        let value = json!({"$module": "tests", "$type": "Raw", "someKey": 1});
        assert_eq!(
            decode(&value, &registry, &CodecOptions::default()).unwrap(),
            Datum::Seq(vec![Datum::from("someKey")])
        );
    }

    #[test]
    fn special_floats_and_timestamps_decode() {
        let value = json!({"$module": "heraldry::codec", "$type": "SpecialFloat", "x": "nan"});
        let nan = decode(&value, &builtins(), &CodecOptions::default()).unwrap();
        assert!(nan.nan_eq(&Datum::Float(f64::NAN)));

        let value = json!({"$module": "heraldry::temporal", "$type": "Timestamp",
                           "year": 2021, "month": 3, "day": 4, "hour": 4, "minute": 6,
                           "second": 7, "microsecond": 0, "timezone": "UTC"});
        match decode(&value, &builtins(), &CodecOptions::default()).unwrap() {
            Datum::Timestamp(ts) => assert_eq!(ts.zone_name(), Some("UTC")),
            other => panic!("expected timestamp, got {other:?}"),
        }
    }
}
