//! Scalar cell values and their declared types.
//!
//! A [`Value`] is what a table cell, a workflow attribute or a condition
//! result holds. [`ValueType`] is the type a formula leaf or a column declares;
//! [`ValueType::coerce`] turns loosely-typed constants (rule-builder values
//! usually arrive as strings) into the declared type.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A single scalar value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / SQL `NULL`.
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the inner string for [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Text(_) => "string",
            Self::DateTime(_) => "datetime",
        }
    }

    /// Compares two values across compatible representations.
    ///
    /// Integers and doubles compare numerically, datetimes compare against
    /// text that parses as a datetime, and same-typed values compare
    /// naturally. Everything else (including `Null`) is incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Double(b)) => (*a as f64).partial_cmp(b),
            (Self::Double(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::Text(b)) => parse_datetime(b).map(|b| a.cmp(&b)),
            (Self::Text(a), Self::DateTime(b)) => parse_datetime(a).map(|a| a.cmp(b)),
            _ => None,
        }
    }

    /// Equality under [`Value::compare`]. Incomparable values are unequal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Text(s) => f.write_str(s),
            Self::DateTime(dt) => f.write_str(&format_datetime(dt)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Double(d) => serializer.serialize_f64(*d),
            Self::Text(s) => serializer.serialize_str(s),
            Self::DateTime(dt) => serializer.serialize_str(&format_datetime(dt)),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar value (null, boolean, number or string)")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Integer(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        Ok(i64::try_from(u).map_or(Value::Double(u as f64), Value::Integer))
    }

    fn visit_f64<E: de::Error>(self, d: f64) -> Result<Value, E> {
        Ok(Value::Double(d))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Text(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::Text(s))
    }
}

// ---------------------------------------------------------------------------
// Datetime helpers
// ---------------------------------------------------------------------------

/// Formats a datetime the way it is stored and compared: RFC 3339, whole
/// seconds, `Z` suffix.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses RFC 3339 and the common `YYYY-MM-DD[ T]HH:MM[:SS]` / `YYYY-MM-DD`
/// forms. Naive inputs are taken as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// ValueType
// ---------------------------------------------------------------------------

/// Declared type of a formula constant or a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Double,
    Boolean,
    String,
    Datetime,
}

/// Returned when a string does not name a [`ValueType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value type: {0}")]
pub struct ParseValueTypeError(pub String);

impl ValueType {
    /// All declared types.
    pub const ALL: [ValueType; 5] = [
        Self::Integer,
        Self::Double,
        Self::Boolean,
        Self::String,
        Self::Datetime,
    ];

    /// Returns the string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Datetime => "datetime",
        }
    }

    /// Returns `true` for the types that support ordering comparisons.
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Integer | Self::Double | Self::Datetime)
    }

    /// Converts `value` into this type, or `None` if it cannot be represented.
    ///
    /// `Null` never coerces.
    pub fn coerce(self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return None;
        }
        match self {
            Self::Integer => match value {
                Value::Integer(i) => Some(Value::Integer(*i)),
                Value::Double(d) => integral(*d).map(Value::Integer),
                Value::Bool(b) => Some(Value::Integer(i64::from(*b))),
                Value::Text(s) => {
                    let s = s.trim();
                    s.parse::<i64>()
                        .ok()
                        .or_else(|| s.parse::<f64>().ok().and_then(integral))
                        .map(Value::Integer)
                }
                _ => None,
            },
            Self::Double => match value {
                Value::Integer(i) => Some(Value::Double(*i as f64)),
                Value::Double(d) => Some(Value::Double(*d)),
                Value::Text(s) => s.trim().parse::<f64>().ok().map(Value::Double),
                _ => None,
            },
            Self::Boolean => match value {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::Integer(i) => Some(Value::Bool(*i == 1)),
                Value::Double(d) => Some(Value::Bool(*d == 1.0)),
                Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" => Some(Value::Bool(true)),
                    "0" | "false" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            Self::String => Some(Value::Text(value.to_string())),
            Self::Datetime => match value {
                Value::DateTime(dt) => Some(Value::DateTime(*dt)),
                Value::Text(s) => parse_datetime(s).map(Value::DateTime),
                _ => None,
            },
        }
    }
}

/// `d` as an `i64` when it is a whole number inside the `i64` range.
fn integral(d: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    let in_range = d >= i64::MIN as f64 && d < i64::MAX as f64;
    (d.is_finite() && d.fract() == 0.0 && in_range).then_some(d as i64)
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ParseValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseValueTypeError(s.to_owned()))
    }
}
