//! Retrieval endpoint: validates caller input and composes the resolver and
//! normalizer into the JSON shapes served to clients.
//!
//! Input validation happens before any network access. "No usable data" is a
//! successful response carrying an explanatory message, not an error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    Config,
    date::DateStamp,
    error::{RetrievalError, UpstreamError},
    model::{Coordinate, DailyRecord},
    provider::{ObservationProvider, PowerClient},
    resolver::{DEFAULT_MAX_STEPS, Resolution, resolve, resolve_range},
};

const SUCCESS_MESSAGE: &str = "Data fetched successfully from NASA POWER API";

/// Raw query parameters, as they arrive in a query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// Single day, `YYYYMMDD`.
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateQuery {
    Day(DateStamp),
    Range { start: DateStamp, end: DateStamp },
}

/// Validated request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalQuery {
    pub coordinate: Coordinate,
    pub dates: DateQuery,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: &str) -> Result<DateStamp, RetrievalError> {
    value
        .parse()
        .map_err(|e| RetrievalError::InvalidParameter(format!("{field}: {e}")))
}

impl RetrievalParams {
    pub fn single_day(coordinate: &Coordinate, date: DateStamp) -> Self {
        Self {
            latitude: Some(coordinate.latitude.clone()),
            longitude: Some(coordinate.longitude.clone()),
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    pub fn range(coordinate: &Coordinate, start: DateStamp, end: DateStamp) -> Self {
        Self {
            latitude: Some(coordinate.latitude.clone()),
            longitude: Some(coordinate.longitude.clone()),
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
            ..Default::default()
        }
    }

    /// `date` takes precedence when both forms are supplied.
    pub fn validate(&self) -> Result<RetrievalQuery, RetrievalError> {
        let (Some(latitude), Some(longitude)) =
            (non_blank(&self.latitude), non_blank(&self.longitude))
        else {
            return Err(RetrievalError::MissingParameter);
        };

        let dates = match (
            non_blank(&self.date),
            non_blank(&self.start_date),
            non_blank(&self.end_date),
        ) {
            (Some(date), _, _) => DateQuery::Day(parse_date("date", date)?),
            (None, Some(start), Some(end)) => {
                let start = parse_date("startDate", start)?;
                let end = parse_date("endDate", end)?;
                if start > end {
                    return Err(RetrievalError::InvalidParameter(format!(
                        "startDate {start} is after endDate {end}"
                    )));
                }
                DateQuery::Range { start, end }
            }
            _ => return Err(RetrievalError::MissingParameter),
        };

        Ok(RetrievalQuery {
            coordinate: Coordinate::new(latitude, longitude),
            dates,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: DateStamp,
    pub end: DateStamp,
}

/// Success body. An empty `weather_data` means no usable data was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResponse {
    pub location: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_date: Option<DateStamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_date: Option<DateStamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_steps: Option<u32>,
    pub weather_data: Vec<DailyRecord>,
    pub message: String,
}

impl RetrievalResponse {
    pub fn has_data(&self) -> bool {
        !self.weather_data.is_empty()
    }
}

/// Composition root for a retrieval; cheap to share across requests.
#[derive(Debug, Clone)]
pub struct Retriever {
    provider: Arc<dyn ObservationProvider>,
    max_steps: u32,
}

impl Retriever {
    pub fn new(provider: Arc<dyn ObservationProvider>, max_steps: u32) -> Self {
        Self {
            provider,
            max_steps,
        }
    }

    pub fn with_provider(provider: Arc<dyn ObservationProvider>) -> Self {
        Self::new(provider, DEFAULT_MAX_STEPS)
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        let client = PowerClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), config.max_fallback_steps))
    }

    #[instrument(skip(self))]
    pub async fn retrieve(
        &self,
        params: &RetrievalParams,
    ) -> Result<RetrievalResponse, RetrievalError> {
        let query = params.validate().inspect_err(|e| warn!(error = %e, "Rejected request"))?;
        let coordinate = &query.coordinate;

        let response = match query.dates {
            DateQuery::Day(target) => {
                let resolution =
                    resolve(self.provider.as_ref(), coordinate, target, self.max_steps).await?;
                day_response(coordinate, target, resolution)
            }
            DateQuery::Range { start, end } => {
                let resolution =
                    resolve_range(self.provider.as_ref(), coordinate, start, end).await?;
                range_response(coordinate, start, end, resolution)
            }
        };

        info!(
            records = response.weather_data.len(),
            used_date = ?response.used_date,
            "Retrieval finished"
        );
        Ok(response)
    }
}

fn day_response(
    coordinate: &Coordinate,
    target: DateStamp,
    resolution: Resolution,
) -> RetrievalResponse {
    let base = RetrievalResponse {
        location: coordinate.clone(),
        requested_date: Some(target),
        used_date: None,
        date_range: None,
        fallback_steps: None,
        weather_data: Vec::new(),
        message: String::new(),
    };

    match resolution {
        Resolution::Found(result) => {
            let message = match result.fallback_steps {
                0 => SUCCESS_MESSAGE.to_string(),
                steps => format!(
                    "No data available for {target}; showing {} ({steps} day(s) earlier)",
                    result.used_date
                ),
            };
            RetrievalResponse {
                used_date: Some(result.used_date),
                fallback_steps: Some(result.fallback_steps),
                weather_data: result.records,
                message,
                ..base
            }
        }
        Resolution::Exhausted {
            last_tried,
            attempts,
            ..
        } => RetrievalResponse {
            fallback_steps: Some(attempts.saturating_sub(1)),
            message: if last_tried == target {
                format!("No usable data found for {target}")
            } else {
                format!("No usable data found between {last_tried} and {target}")
            },
            ..base
        },
    }
}

fn range_response(
    coordinate: &Coordinate,
    start: DateStamp,
    end: DateStamp,
    resolution: Resolution,
) -> RetrievalResponse {
    let (weather_data, message) = match resolution {
        Resolution::Found(result) => (result.records, SUCCESS_MESSAGE.to_string()),
        Resolution::Exhausted { .. } => (
            Vec::new(),
            format!("No usable data found between {start} and {end}"),
        ),
    };

    RetrievalResponse {
        location: coordinate.clone(),
        requested_date: None,
        used_date: None,
        date_range: Some(DateRange { start, end }),
        fallback_steps: None,
        weather_data,
        message,
    }
}
