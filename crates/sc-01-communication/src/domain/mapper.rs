//! # Payload Mapper
//!
//! Explicit, immutable conversion settings handed to every component that
//! turns node JSON into typed values. Nodes sometimes answer a list-shaped
//! call with a bare value, so sequences accept a single element too.

use crate::domain::errors::MapperError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Pattern the node uses for every timestamp.
pub const DEFAULT_DATE_TIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadMapper {
    date_time_pattern: String,
    time_zone: FixedOffset,
}

impl PayloadMapper {
    pub fn new(date_time_pattern: &str, time_zone: &str) -> Result<Self, MapperError> {
        let has_error = StrftimeItems::new(date_time_pattern).any(|item| matches!(item, Item::Error));
        if date_time_pattern.is_empty() || has_error {
            return Err(MapperError::InvalidPattern(date_time_pattern.to_string()));
        }
        Ok(Self {
            date_time_pattern: date_time_pattern.to_string(),
            time_zone: parse_time_zone(time_zone)?,
        })
    }

    pub fn date_time_pattern(&self) -> &str {
        &self.date_time_pattern
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    /// Decode one value.
    pub fn decode<T: DeserializeOwned>(&self, mut value: Value) -> Result<T, serde_json::Error> {
        self.normalize_timestamps(&mut value);
        serde_json::from_value(value)
    }

    /// Decode a result as a sequence of `T`.
    pub fn to_sequence<T: DeserializeOwned>(&self, mut value: Value) -> Result<Vec<T>, serde_json::Error> {
        self.normalize_timestamps(&mut value);
        match value {
            Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
            single => Ok(vec![serde_json::from_value(single)?]),
        }
    }

    /// Rewrite every string that reads as a timestamp in the configured
    /// pattern and zone into the node's UTC form, which typed models parse.
    pub fn normalize_timestamps(&self, value: &mut Value) {
        if self.is_node_format() {
            return;
        }
        match value {
            Value::String(text) => {
                if let Ok(instant) = self.parse_timestamp(text) {
                    *text = instant
                        .with_timezone(&Utc)
                        .format(DEFAULT_DATE_TIME_PATTERN)
                        .to_string();
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|item| self.normalize_timestamps(item)),
            Value::Object(fields) => fields
                .values_mut()
                .for_each(|field| self.normalize_timestamps(field)),
            _ => {}
        }
    }

    fn is_node_format(&self) -> bool {
        self.date_time_pattern == DEFAULT_DATE_TIME_PATTERN && self.time_zone == Utc.fix()
    }

    /// Parse a payload timestamp written in the configured pattern and zone.
    pub fn parse_timestamp(&self, value: &str) -> Result<DateTime<FixedOffset>, MapperError> {
        let invalid = |reason: String| MapperError::InvalidTimestamp {
            value: value.to_string(),
            reason,
        };
        let naive = NaiveDateTime::parse_from_str(value, &self.date_time_pattern)
            .map_err(|e| invalid(e.to_string()))?;
        self.time_zone
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| invalid("ambiguous local time".into()))
    }

    pub fn format_timestamp(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.time_zone)
            .format(&self.date_time_pattern)
            .to_string()
    }
}

impl Default for PayloadMapper {
    fn default() -> Self {
        Self {
            date_time_pattern: DEFAULT_DATE_TIME_PATTERN.to_string(),
            time_zone: Utc.fix(),
        }
    }
}

/// `UTC`, `GMT`, `Z`, or an offset such as `+02:00` / `-0530`.
fn parse_time_zone(zone: &str) -> Result<FixedOffset, MapperError> {
    let invalid = || MapperError::InvalidTimeZone(zone.to_string());
    let trimmed = zone.trim();
    if matches!(trimmed.to_ascii_uppercase().as_str(), "UTC" | "GMT" | "Z") {
        return Ok(Utc.fix());
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
