//! Date and time types with a fixed JSON wire format.
//!
//! Timestamps are always written in UTC. On input, RFC 3339 is accepted as well as the zone-less
//! `YYYY-MM-DDTHH:MM:SS[.ffffff]` form Postgres emits, which is read as UTC.

use std::fmt;

use chrono::{
    DateTime as ChronoDateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const ZONELESS_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Timestamp serialized with second precision, e.g. `2016-12-30T10:11:12Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct DateTime(ChronoDateTime<Utc>);

/// Timestamp serialized with nanosecond precision and trailing zeros trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct DateTimeNano(ChronoDateTime<Utc>);

/// Calendar date serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct Date(NaiveDate);

fn parse_timestamp(value: &str) -> Result<ChronoDateTime<Utc>, chrono::ParseError> {
    match ChronoDateTime::parse_from_rfc3339(value) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(err) => NaiveDateTime::parse_from_str(value, ZONELESS_LAYOUT)
            .map(|naive| naive.and_utc())
            .map_err(|_| err),
    }
}

fn format_seconds(value: &ChronoDateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn format_nanos(value: &ChronoDateTime<Utc>) -> String {
    let seconds = value.format("%Y-%m-%dT%H:%M:%S");
    match value.timestamp_subsec_nanos() {
        0 => format!("{seconds}Z"),
        nanos => {
            let fraction = format!("{nanos:09}");
            format!("{seconds}.{}Z", fraction.trim_end_matches('0'))
        }
    }
}

macro_rules! timestamp_type {
    ($name:ident, $format:ident) => {
        impl $name {
            pub fn now() -> Self {
                Self(Utc::now())
            }

            pub fn into_inner(self) -> ChronoDateTime<Utc> {
                self.0
            }
        }

        impl From<ChronoDateTime<Utc>> for $name {
            fn from(value: ChronoDateTime<Utc>) -> Self {
                Self(value)
            }
        }

        impl From<$name> for ChronoDateTime<Utc> {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = chrono::ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_timestamp(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&$format(&self.0))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&$format(&self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                parse_timestamp(&raw).map(Self).map_err(de::Error::custom)
            }
        }
    };
}

timestamp_type!(DateTime, format_seconds);
timestamp_type!(DateTimeNano, format_nanos);

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Option<Date> {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_LAYOUT).ok().map(Date)
}

impl Date {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn into_inner(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for Date {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

/// Calendar date of a timestamp in its own time zone.
impl<Tz: TimeZone> From<ChronoDateTime<Tz>> for Date {
    fn from(value: ChronoDateTime<Tz>) -> Self {
        Self(value.date_naive())
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_LAYOUT))
    }
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date format {raw}")))
    }
}
