use super::{MODULE_KEY, TYPE_KEY, special};
use crate::case::{camel_case, snake_case};
use crate::config::CodecOptions;
use crate::datum::{Datum, Foreign};
use crate::error::CodecError;
use crate::statics::{Instance, Member};
use crate::temporal::{self, Timestamp};
use crate::types::{Shape, Tagged, TypePath};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A timestamp with a bare offset was shifted to UTC.
    CoercedTimezone,
    /// A foreign value was emitted as-is.
    Unsupported,
}

/// Non-fatal finding recorded while encoding.
///
/// Strict callers can treat any diagnostic as an error; the encoded output is
/// still produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Encoder that keeps the diagnostics of every value it has encoded.
#[derive(Debug)]
pub struct Encoder {
    options: CodecOptions,
    diagnostics: Vec<Diagnostic>,
}

/// Encode one value, discarding diagnostics (they are still logged).
pub fn encode(datum: &Datum, options: &CodecOptions) -> Result<Value, CodecError> {
    Encoder::new(*options).encode(datum)
}

impl Encoder {
    pub fn new(options: CodecOptions) -> Self {
        Self {
            options,
            diagnostics: Vec::new(),
        }
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn encode(&mut self, datum: &Datum) -> Result<Value, CodecError> {
        match datum {
            Datum::Tagged(value) => self.tagged(value.as_ref()),
            Datum::Float(x) => Ok(self.float(*x)),
            Datum::Null => Ok(Value::Null),
            Datum::Bool(value) => Ok(Value::Bool(*value)),
            Datum::Int(value) => Ok(Value::from(*value)),
            Datum::Str(value) => Ok(Value::String(value.clone())),
            Datum::Seq(items) => items
                .iter()
                .map(|item| self.encode(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Datum::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let value = self.encode(value)?;
                    map.insert(self.key(key)?, value);
                }
                Ok(Value::Object(map))
            }
            Datum::Date(date) => Ok(if self.options.type_tags {
                let mut map = Map::new();
                temporal::date_fields(date, &mut map);
                self.finish(map, &temporal::date_path())
            } else {
                Value::String(temporal::date_string(date))
            }),
            Datum::Time(time) => Ok(if self.options.type_tags {
                let mut map = Map::new();
                temporal::time_fields(time, &mut map);
                self.finish(map, &temporal::time_path())
            } else {
                Value::String(temporal::time_string(time))
            }),
            Datum::Timestamp(ts) => Ok(self.timestamp(ts)),
            Datum::Member(member) => self.member(member),
            Datum::Instance(instance) => self.instance(instance),
            Datum::Foreign(foreign) => Ok(self.foreign(foreign)),
        }
    }

    fn tagged(&mut self, value: &dyn Tagged) -> Result<Value, CodecError> {
        let path = value.type_path();
        match value.shape() {
            Shape::Custom(map) => {
                for key in map.keys() {
                    check_reserved(&path, key)?;
                }
                Ok(self.finish(map, &path))
            }
            Shape::Variant { name, payload } => {
                if !self.options.type_tags {
                    return Ok(Value::String(format!("{}.{}", path.name, name)));
                }
                let mut map = Map::new();
                map.insert("name".into(), Value::String(name.to_string()));
                map.insert("value".into(), self.encode(&payload)?);
                Ok(self.finish(map, &path))
            }
            Shape::Record(fields) => {
                let mut map = Map::new();
                for (field, value) in &fields {
                    check_reserved(&path, field)?;
                    let value = self.encode(value)?;
                    map.insert(self.key(field)?, value);
                }
                Ok(self.finish(map, &path))
            }
        }
    }

    fn float(&self, x: f64) -> Value {
        let Some(label) = special::label(x) else {
            return Value::from(x);
        };
        if self.options.type_tags {
            let mut map = Map::new();
            map.insert("x".into(), Value::String(label.into()));
            self.finish(map, &special::path())
        } else {
            Value::String(label.into())
        }
    }

    fn timestamp(&mut self, ts: &Timestamp) -> Value {
        let coerced;
        let ts = match ts {
            Timestamp::Fixed(dt) => {
                let message = format!("timestamp {dt} has no named timezone; shifted to UTC");
                warn!(timestamp = %dt, "coercing fixed-offset timestamp to UTC");
                self.diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::CoercedTimezone,
                    message,
                });
                coerced = Timestamp::Utc(dt.with_timezone(&Utc));
                &coerced
            }
            other => other,
        };
        if self.options.type_tags {
            let mut map = Map::new();
            temporal::timestamp_fields(ts, &mut map);
            self.finish(map, &temporal::timestamp_path())
        } else {
            Value::String(temporal::timestamp_string(ts))
        }
    }

    fn member(&mut self, member: &Member) -> Result<Value, CodecError> {
        let mut map = Map::new();
        for (field, value) in member.fixed_fields() {
            let value = self.encode(value)?;
            map.insert(self.key(field)?, value);
        }
        map.insert("name".into(), Value::String(member.name().to_string()));
        Ok(self.finish(map, member.category_path()))
    }

    fn instance(&mut self, instance: &Instance) -> Result<Value, CodecError> {
        let mut map = Map::new();
        for (field, value) in instance.mutable_fields() {
            let value = self.encode(value)?;
            map.insert(self.key(field)?, value);
        }
        Ok(self.finish(map, &instance.member().path()))
    }

    fn foreign(&mut self, foreign: &Foreign) -> Value {
        warn!(type_name = %foreign.type_name, "no encoding for value; emitting it unchanged");
        self.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::Unsupported,
            message: format!("{} has no encoding and was emitted as-is", foreign.type_name),
        });
        foreign.raw.clone()
    }

    fn key(&self, key: &str) -> Result<String, CodecError> {
        if self.options.camel_case_keys {
            camel_case(&snake_case(key)?)
        } else {
            Ok(key.to_string())
        }
    }

    /// Attach the tag when tagging is on.
    fn finish(&self, mut map: Map<String, Value>, path: &TypePath) -> Value {
        if self.options.type_tags {
            map.insert(MODULE_KEY.into(), Value::String(path.module.clone()));
            map.insert(TYPE_KEY.into(), Value::String(path.name.clone()));
        }
        Value::Object(map)
    }
}

fn check_reserved(path: &TypePath, key: &str) -> Result<(), CodecError> {
    if key == MODULE_KEY || key == TYPE_KEY {
        return Err(CodecError::ReservedKey {
            path: path.clone(),
            key: key.to_string(),
        });
    }
    Ok(())
}
