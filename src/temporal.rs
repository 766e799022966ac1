//! Dates, times and timestamps.
//!
//! Tagged encodings break values into numeric components; untagged encodings
//! are ISO-like strings. Timestamps remember which timezone implementation
//! they carry so the encoder can tell a database zone (kept by identifier)
//! from a bare fixed offset (coerced to UTC).

use crate::datum::{Datum, Fields};
use crate::error::FieldError;
use crate::types::TypePath;
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use serde_json::{Map, Value};

pub const MODULE: &str = "heraldry::temporal";

const UTC_ZONE: &str = "UTC";

pub fn date_path() -> TypePath {
    TypePath::new(MODULE, "Date")
}

pub fn time_path() -> TypePath {
    TypePath::new(MODULE, "Time")
}

pub fn timestamp_path() -> TypePath {
    TypePath::new(MODULE, "Timestamp")
}

/// A point in time plus the timezone implementation it was created with.
///
/// Equality follows the instant: naive timestamps compare by wall clock, aware
/// ones by their UTC reading whatever zone carries them, and the two kinds
/// never compare equal.
#[derive(Clone, Debug)]
pub enum Timestamp {
    /// Wall-clock time with no zone attached.
    Naive(NaiveDateTime),
    Utc(DateTime<Utc>),
    /// A zone from the tz database, serialized by identifier.
    Zoned(DateTime<Tz>),
    /// A bare offset with no identifier; not round-trippable as a zone.
    Fixed(DateTime<FixedOffset>),
}

impl Timestamp {
    /// Local wall-clock reading in the timestamp's own zone.
    pub fn local(&self) -> NaiveDateTime {
        match self {
            Timestamp::Naive(dt) => *dt,
            Timestamp::Utc(dt) => dt.naive_utc(),
            Timestamp::Zoned(dt) => dt.naive_local(),
            Timestamp::Fixed(dt) => dt.naive_local(),
        }
    }

    /// Identifier written to the `timezone` field, when the zone has one.
    pub fn zone_name(&self) -> Option<&'static str> {
        match self {
            Timestamp::Naive(_) | Timestamp::Fixed(_) => None,
            Timestamp::Utc(_) => Some(UTC_ZONE),
            Timestamp::Zoned(dt) => {
                let tz = dt.timezone();
                if is_utc_marker(tz) {
                    Some(UTC_ZONE)
                } else {
                    Some(tz.name())
                }
            }
        }
    }

    /// Same instant in UTC; `None` for naive timestamps.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Naive(_) => None,
            Timestamp::Utc(dt) => Some(*dt),
            Timestamp::Zoned(dt) => Some(dt.with_timezone(&Utc)),
            Timestamp::Fixed(dt) => Some(dt.with_timezone(&Utc)),
        }
    }

    /// Rebuild a timestamp from wall-clock components and a zone identifier.
    pub fn from_parts(local: NaiveDateTime, zone: Option<&str>) -> Result<Self, String> {
        let Some(zone) = zone else {
            return Ok(Timestamp::Naive(local));
        };
        if zone == UTC_ZONE {
            return Ok(Timestamp::Utc(Utc.from_utc_datetime(&local)));
        }
        let tz: Tz = zone
            .parse()
            .map_err(|_| format!("unknown timezone {zone:?}"))?;
        tz.from_local_datetime(&local)
            .earliest()
            .map(Timestamp::Zoned)
            .ok_or_else(|| format!("{local} does not exist in {zone}"))
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Timestamp::Naive(a), Timestamp::Naive(b)) => a == b,
            (Timestamp::Naive(_), _) | (_, Timestamp::Naive(_)) => false,
            _ => self.to_utc() == other.to_utc(),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Utc(value)
    }
}

impl From<DateTime<Tz>> for Timestamp {
    fn from(value: DateTime<Tz>) -> Self {
        Timestamp::Zoned(value)
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Timestamp::Fixed(value)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Timestamp::Naive(value)
    }
}

fn is_utc_marker(tz: Tz) -> bool {
    matches!(
        tz.name(),
        "UTC" | "UCT" | "Zulu" | "Universal" | "Etc/UTC" | "Etc/UCT" | "Etc/Zulu" | "Etc/Universal"
    )
}

fn microsecond(time: &impl Timelike) -> u32 {
    time.nanosecond() / 1_000
}

pub(crate) fn date_string(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn time_string(time: &NaiveTime) -> String {
    time.format("%H:%M:%S%.6f").to_string()
}

pub(crate) fn timestamp_string(ts: &Timestamp) -> String {
    const NAIVE: &str = "%Y-%m-%dT%H:%M:%S%.6f";
    const AWARE: &str = "%Y-%m-%dT%H:%M:%S%.6f%z";
    match ts {
        Timestamp::Naive(dt) => dt.format(NAIVE).to_string(),
        Timestamp::Utc(dt) => dt.format(AWARE).to_string(),
        Timestamp::Zoned(dt) => dt.format(AWARE).to_string(),
        Timestamp::Fixed(dt) => dt.format(AWARE).to_string(),
    }
}

pub(crate) fn date_fields(date: &NaiveDate, map: &mut Map<String, Value>) {
    map.insert("year".into(), date.year().into());
    map.insert("month".into(), date.month().into());
    map.insert("day".into(), date.day().into());
}

pub(crate) fn time_fields(time: &impl Timelike, map: &mut Map<String, Value>) {
    map.insert("hour".into(), time.hour().into());
    map.insert("minute".into(), time.minute().into());
    map.insert("second".into(), time.second().into());
    map.insert("microsecond".into(), microsecond(time).into());
}

pub(crate) fn timestamp_fields(ts: &Timestamp, map: &mut Map<String, Value>) {
    let local = ts.local();
    date_fields(&local.date(), map);
    time_fields(&local.time(), map);
    let zone = ts
        .zone_name()
        .map_or(Value::Null, |name| Value::String(name.to_string()));
    map.insert("timezone".into(), zone);
}

fn take_date(fields: &mut Fields) -> Result<NaiveDate, FieldError> {
    let year: i32 = fields.take("year")?;
    let month: u32 = fields.take("month")?;
    let day: u32 = fields.take("day")?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| FieldError::invalid("day", format!("{year}-{month}-{day} is not a date")))
}

fn take_time(fields: &mut Fields) -> Result<NaiveTime, FieldError> {
    let hour: u32 = fields.take("hour")?;
    let minute: u32 = fields.take("minute")?;
    let second: u32 = fields.take("second")?;
    let micro: u32 = fields.take("microsecond")?;
    NaiveTime::from_hms_micro_opt(hour, minute, second, micro).ok_or_else(|| {
        FieldError::invalid(
            "microsecond",
            format!("{hour}:{minute}:{second}.{micro} is not a time of day"),
        )
    })
}

pub(crate) fn date_from_fields(mut fields: Fields) -> Result<Datum, FieldError> {
    let date = take_date(&mut fields)?;
    fields.finish()?;
    Ok(Datum::Date(date))
}

pub(crate) fn time_from_fields(mut fields: Fields) -> Result<Datum, FieldError> {
    let time = take_time(&mut fields)?;
    fields.finish()?;
    Ok(Datum::Time(time))
}

pub(crate) fn timestamp_from_fields(mut fields: Fields) -> Result<Datum, FieldError> {
    let date = take_date(&mut fields)?;
    let time = take_time(&mut fields)?;
    let zone: Option<String> = fields.take("timezone")?;
    fields.finish()?;
    Timestamp::from_parts(date.and_time(time), zone.as_deref())
        .map(Datum::Timestamp)
        .map_err(|reason| FieldError::invalid("timezone", reason))
}
