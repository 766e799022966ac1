//! Per-call codec options and their environment overrides.
//!
//! `HERALDRY_CAMEL_CASE_KEYS` and `HERALDRY_TYPE_TAGS` switch the defaults off
//! with `0`, `false`, `no` or `off`; empty values are ignored. CLI flags are
//! applied on top of whatever this produces.

use std::env;

pub const CAMEL_CASE_KEYS_ENV: &str = "HERALDRY_CAMEL_CASE_KEYS";
pub const TYPE_TAGS_ENV: &str = "HERALDRY_TYPE_TAGS";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    /// Write mapping and record keys in `camelCase`; read them back as `snake_case`.
    pub camel_case_keys: bool,
    /// Embed `$module`/`$type` tags so values decode to their original type.
    pub type_tags: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            camel_case_keys: true,
            type_tags: true,
        }
    }
}

impl CodecOptions {
    pub fn untagged(self) -> Self {
        Self {
            type_tags: false,
            ..self
        }
    }

    pub fn snake_keys(self) -> Self {
        Self {
            camel_case_keys: false,
            ..self
        }
    }

    /// Defaults adjusted by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults adjusted by an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            camel_case_keys: lookup(CAMEL_CASE_KEYS_ENV)
                .and_then(|v| flag_value(&v))
                .unwrap_or(defaults.camel_case_keys),
            type_tags: lookup(TYPE_TAGS_ENV)
                .and_then(|v| flag_value(&v))
                .unwrap_or(defaults.type_tags),
        }
    }
}

/// Interpret a boolean-ish environment value; `None` leaves the default.
fn flag_value(raw: &str) -> Option<bool> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    Some(!matches!(
        value.to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_enable_everything() {
        assert_eq!(
            CodecOptions::from_lookup(lookup(&[])),
            CodecOptions {
                camel_case_keys: true,
                type_tags: true,
            }
        );
    }

    #[test]
    fn falsy_values_disable_flags() {
        for off in ["0", "false", "No", " OFF "] {
            let options = CodecOptions::from_lookup(lookup(&[(TYPE_TAGS_ENV, off)]));
            assert!(!options.type_tags, "{off:?} should disable tags");
            assert!(options.camel_case_keys);
        }
    }

    #[test]
    fn empty_and_truthy_values_keep_defaults() {
        let options = CodecOptions::from_lookup(lookup(&[
            (CAMEL_CASE_KEYS_ENV, "  "),
            (TYPE_TAGS_ENV, "1"),
        ]));
        assert_eq!(options, CodecOptions::default());
    }

    #[test]
    fn builders_flip_single_flags() {
        let options = CodecOptions::default().untagged().snake_keys();
        assert!(!options.type_tags);
        assert!(!options.camel_case_keys);
    }
}
