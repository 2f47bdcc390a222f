//! # Timestamps
//!
//! Second-resolution UTC timestamps as used for transaction expiration
//! and block times.

use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
use crate::errors::{CodecError, TypeError};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Date format the node uses for every timestamp in JSON.
pub const NODE_DATE_TIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%S";

/// Seconds since the Unix epoch, serialized as a `u32`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePointSec(u32);

impl TimePointSec {
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub fn secs(&self) -> u32 {
        self.0
    }

    /// Current wall clock time, truncated to seconds.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now()).unwrap_or_default()
    }

    pub fn from_datetime(time: DateTime<Utc>) -> Result<Self, TypeError> {
        u32::try_from(time.timestamp())
            .map(Self)
            .map_err(|_| TypeError::InvalidTimestamp(format!("{time} is outside the u32 range")))
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(i64::from(self.0), 0).unwrap_or_default()
    }

    pub fn plus_secs(&self, secs: u32) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format(NODE_DATE_TIME_PATTERN))
    }
}

impl FromStr for TimePointSec {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let naive = NaiveDateTime::parse_from_str(s, NODE_DATE_TIME_PATTERN)
            .map_err(|e| TypeError::InvalidTimestamp(format!("'{s}': {e}")))?;
        Self::from_datetime(naive.and_utc())
    }
}

impl Serialize for TimePointSec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimePointSec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Encode for TimePointSec {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.0);
    }
}

impl Decode for TimePointSec {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self(reader.read_u32()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_format() {
        let time: TimePointSec = "2016-04-06T08:29:34".parse().unwrap();
        assert_eq!(time.secs(), 1459931374);
        assert_eq!(time.to_string(), "2016-04-06T08:29:34");
    }

    #[test]
    fn test_rejects_other_formats() {
        assert!("2016-04-06 08:29:34".parse::<TimePointSec>().is_err());
        assert!("1969-12-31T23:59:59".parse::<TimePointSec>().is_err());
    }

    #[test]
    fn test_plus_secs() {
        let time = TimePointSec::from_secs(1459931314);
        assert_eq!(time.plus_secs(60).to_string(), "2016-04-06T08:29:34");
    }
}
