use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::date::DateStamp;

/// Placeholder the upstream reports when no ground observation exists.
pub const MISSING_SENTINEL: f64 = -999.0;

/// Point location as supplied by the caller, forwarded to the upstream verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: String,
    pub longitude: String,
}

impl Coordinate {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }
}

/// Per-day values of one upstream parameter. `None` is a JSON `null`.
pub type ParameterSeries = BTreeMap<DateStamp, Option<f64>>;

/// The three tracked parameters for one query window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObservationSet {
    pub temperature: ParameterSeries,
    pub precipitation: Option<ParameterSeries>,
    pub wind_speed: Option<ParameterSeries>,
}

/// One normalized row of output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    pub date: DateStamp,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub coordinate: Coordinate,
    pub used_date: DateStamp,
    pub records: Vec<DailyRecord>,
    pub fallback_steps: u32,
}
