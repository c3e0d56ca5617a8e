use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

const FORMAT: &str = "%Y%m%d";

/// Calendar day in the upstream's compact `YYYYMMDD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateStamp(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid date '{0}': expected an 8-digit YYYYMMDD calendar date")]
pub struct DateStampError(pub String);

impl DateStamp {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The calendar day before this one, across month and year boundaries.
    pub fn previous_day(self) -> Self {
        // NaiveDate::MIN is far outside anything the upstream serves.
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    pub fn next_day(self) -> Self {
        Self(self.0.succ_opt().unwrap_or(self.0))
    }
}

impl From<NaiveDate> for DateStamp {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for DateStamp {
    type Err = DateStampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts shorter numeric fields, so enforce the fixed width here.
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DateStampError(s.to_string()));
        }

        NaiveDate::parse_from_str(s, FORMAT)
            .map(Self)
            .map_err(|_| DateStampError(s.to_string()))
    }
}

impl fmt::Display for DateStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl Serialize for DateStamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateStamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
