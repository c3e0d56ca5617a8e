use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::{
    Config,
    date::DateStamp,
    error::UpstreamError,
    model::{Coordinate, ParameterSeries, RawObservationSet},
};

use super::ObservationProvider;

/// Temperature at 2 m, the primary parameter.
pub const PARAM_TEMPERATURE: &str = "T2M";
/// Total precipitation.
pub const PARAM_PRECIPITATION: &str = "PRECTOT";
/// Wind speed at 10 m.
pub const PARAM_WIND_SPEED: &str = "WS10M";

/// Client for the NASA POWER daily point API.
#[derive(Debug, Clone)]
pub struct PowerClient {
    http: Client,
    base_url: String,
    community: String,
}

impl PowerClient {
    pub fn new(
        base_url: impl Into<String>,
        community: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| {
            UpstreamError::InvalidRequest(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            community: community.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        Self::new(
            config.base_url.clone(),
            config.community.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn check_request(
        coordinate: &Coordinate,
        start: DateStamp,
        end: DateStamp,
    ) -> Result<(), UpstreamError> {
        if coordinate.latitude.trim().is_empty() || coordinate.longitude.trim().is_empty() {
            return Err(UpstreamError::InvalidRequest(
                "latitude and longitude must be non-empty".to_string(),
            ));
        }
        if start > end {
            return Err(UpstreamError::InvalidRequest(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PowerEnvelope {
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    parameter: PowerParameters,
}

#[derive(Debug, Deserialize)]
struct PowerParameters {
    #[serde(rename = "T2M")]
    temperature: ParameterSeries,
    // Newer POWER releases report the corrected series under PRECTOTCORR.
    #[serde(rename = "PRECTOT", alias = "PRECTOTCORR", default)]
    precipitation: Option<ParameterSeries>,
    #[serde(rename = "WS10M", default)]
    wind_speed: Option<ParameterSeries>,
}

impl From<PowerEnvelope> for RawObservationSet {
    fn from(envelope: PowerEnvelope) -> Self {
        let p = envelope.properties.parameter;
        Self {
            temperature: p.temperature,
            precipitation: p.precipitation,
            wind_speed: p.wind_speed,
        }
    }
}

fn parse_envelope(body: &str) -> Result<RawObservationSet, UpstreamError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| UpstreamError::Format {
            message: format!("body is not JSON: {e}"),
            raw: serde_json::Value::String(truncate_body(body)),
        })?;

    match serde_json::from_value::<PowerEnvelope>(value.clone()) {
        Ok(envelope) => Ok(envelope.into()),
        Err(e) => Err(UpstreamError::Format {
            message: e.to_string(),
            raw: value,
        }),
    }
}

#[async_trait]
impl ObservationProvider for PowerClient {
    #[instrument(
        skip(self, coordinate),
        fields(lat = %coordinate.latitude, lon = %coordinate.longitude)
    )]
    async fn fetch_range(
        &self,
        coordinate: &Coordinate,
        start: DateStamp,
        end: DateStamp,
    ) -> Result<RawObservationSet, UpstreamError> {
        Self::check_request(coordinate, start, end)?;

        let parameters = [PARAM_TEMPERATURE, PARAM_PRECIPITATION, PARAM_WIND_SPEED].join(",");
        let start = start.to_string();
        let end = end.to_string();

        debug!(url = %self.base_url, "Fetching NASA POWER daily point data");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("parameters", parameters.as_str()),
                ("community", self.community.as_str()),
                ("longitude", coordinate.longitude.as_str()),
                ("latitude", coordinate.latitude.as_str()),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("format", "JSON"),
            ])
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable {
                status: None,
                details: e.to_string(),
            })?;

        let status = res.status();
        // Status line arrived but the body did not.
        let body = res.text().await.map_err(|e| UpstreamError::Unavailable {
            status: None,
            details: format!("Failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            warn!(%status, body = %truncate_body(&body), "NASA POWER request failed");
            return Err(UpstreamError::Unavailable {
                status: Some(status.as_u16()),
                details: truncate_body(&body),
            });
        }

        let raw = parse_envelope(&body)?;
        debug!(days = raw.temperature.len(), "Parsed NASA POWER response");
        Ok(raw)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_envelope() {
        let body = json!({
            "type": "Feature",
            "properties": {
                "parameter": {
                    "T2M": { "20240614": 17.2, "20240615": -999.0 },
                    "PRECTOT": { "20240614": 0.4 },
                    "WS10M": { "20240614": 3.1, "20240615": null }
                }
            }
        })
        .to_string();

        let raw = parse_envelope(&body).expect("valid envelope");
        let d14: DateStamp = "20240614".parse().unwrap();
        let d15: DateStamp = "20240615".parse().unwrap();

        assert_eq!(raw.temperature.get(&d14), Some(&Some(17.2)));
        assert_eq!(raw.temperature.get(&d15), Some(&Some(-999.0)));
        assert_eq!(raw.precipitation.as_ref().and_then(|p| p.get(&d15)), None);
        assert_eq!(raw.wind_speed.as_ref().and_then(|w| w.get(&d15)), Some(&None));
    }

    #[test]
    fn accepts_corrected_precipitation_code() {
        let body = json!({
            "properties": { "parameter": {
                "T2M": { "20240614": 17.2 },
                "PRECTOTCORR": { "20240614": 1.5 }
            }}
        })
        .to_string();

        let raw = parse_envelope(&body).expect("valid envelope");
        assert!(raw.precipitation.is_some());
        assert!(raw.wind_speed.is_none());
    }

    #[test]
    fn missing_primary_parameter_is_format_error() {
        let payload = json!({ "properties": { "parameter": { "WS10M": {} } } });
        let err = parse_envelope(&payload.to_string()).unwrap_err();

        match err {
            UpstreamError::Format { raw, .. } => assert_eq!(raw, payload),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_format_error() {
        let err = parse_envelope("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, UpstreamError::Format { .. }));
    }

    #[test]
    fn malformed_date_key_is_format_error() {
        let body = json!({ "properties": { "parameter": { "T2M": { "2024-06-14": 1.0 } } } });
        assert!(parse_envelope(&body.to_string()).is_err());
    }

    #[test]
    fn rejects_inverted_range_before_network() {
        let c = Coordinate::new("51.5074", "0.1278");
        let start: DateStamp = "20240615".parse().unwrap();
        let end: DateStamp = "20240614".parse().unwrap();
        assert!(matches!(
            PowerClient::check_request(&c, start, end),
            Err(UpstreamError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_blank_coordinate() {
        let c = Coordinate::new(" ", "0.1278");
        let d: DateStamp = "20240615".parse().unwrap();
        assert!(PowerClient::check_request(&c, d, d).is_err());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(600);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 503);
        assert_eq!(truncate_body("short"), "short");
    }
}
