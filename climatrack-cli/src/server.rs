//! HTTP surface over the core: `/api/nasa-power`, `/api/geocode`, `/health`.

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use climatrack_core::{CityTable, ErrorBody, RetrievalError, RetrievalParams, Retriever};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AppState {
    retriever: Arc<Retriever>,
    cities: Arc<CityTable>,
}

impl AppState {
    pub fn new(retriever: Retriever, cities: CityTable) -> Self {
        Self {
            retriever: Arc::new(retriever),
            cities: Arc::new(cities),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/nasa-power", get(nasa_power))
        .route("/api/geocode", get(geocode))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(%bind, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}

async fn nasa_power(
    State(state): State<AppState>,
    params: Result<Query<RetrievalParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return error_response(&RetrievalError::InvalidParameter(rejection.body_text()));
        }
    };

    match state.retriever.retrieve(&params).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &RetrievalError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(err.to_body())).into_response()
}

#[derive(Debug, Deserialize)]
struct GeocodeParams {
    location: Option<String>,
}

async fn geocode(
    State(state): State<AppState>,
    params: Result<Query<GeocodeParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match params.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        Some(location) => Json(state.cities.resolve(location)).into_response(),
        None => bad_request("Location parameter is required".to_string()),
    }
}

fn bad_request(error: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error,
            details: None,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use climatrack_core::{
        Coordinate, DateStamp, ObservationProvider, RawObservationSet, UpstreamError,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Returns `value` for every day of the requested window.
    #[derive(Debug)]
    struct FixedProvider {
        value: Result<f64, u16>,
    }

    #[async_trait]
    impl ObservationProvider for FixedProvider {
        async fn fetch_range(
            &self,
            _coordinate: &Coordinate,
            start: DateStamp,
            end: DateStamp,
        ) -> Result<RawObservationSet, UpstreamError> {
            let value = self.value.map_err(|status| UpstreamError::Unavailable {
                status: Some(status),
                details: "down".into(),
            })?;

            let mut raw = RawObservationSet::default();
            let mut day = start;
            while day <= end {
                raw.temperature.insert(day, Some(value));
                day = day.next_day();
            }
            Ok(raw)
        }
    }

    fn app(value: Result<f64, u16>) -> Router {
        let retriever = Retriever::with_provider(Arc::new(FixedProvider { value }));
        router(AppState::new(retriever, CityTable::default()))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_dates_is_bad_request() {
        let (status, body) =
            get_json(app(Ok(18.0)), "/api/nasa-power?latitude=51.5074&longitude=0.1278").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Missing latitude, longitude, or date/date range parameters"
        );
    }

    #[tokio::test]
    async fn single_day_returns_records() {
        let (status, body) = get_json(
            app(Ok(18.0)),
            "/api/nasa-power?latitude=51.5074&longitude=0.1278&date=20240615",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["usedDate"], "20240615");
        assert_eq!(body["fallbackSteps"], 0);
        assert_eq!(body["weatherData"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn placeholder_only_is_ok_with_message() {
        let (status, body) = get_json(
            app(Ok(-999.0)),
            "/api/nasa-power?latitude=1&longitude=2&startDate=20240601&endDate=20240603",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weatherData"], json!([]));
        assert_eq!(
            body["message"],
            "No usable data found between 20240601 and 20240603"
        );
    }

    #[tokio::test]
    async fn upstream_status_is_forwarded() {
        let (status, body) =
            get_json(app(Err(503)), "/api/nasa-power?latitude=1&longitude=2&date=20240615").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["details"], "down");
    }

    #[tokio::test]
    async fn duplicate_query_field_is_json_bad_request() {
        let (status, body) = get_json(
            app(Ok(18.0)),
            "/api/nasa-power?latitude=1&latitude=2&longitude=2&date=20240615",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = body["error"].as_str().expect("error message");
        assert!(error.starts_with("Invalid parameter"), "{error}");
        assert!(error.contains("latitude"), "{error}");
    }

    #[tokio::test]
    async fn geocode_duplicate_location_is_json_bad_request() {
        let (status, body) =
            get_json(app(Ok(1.0)), "/api/geocode?location=Paris&location=Tokyo").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|e| e.contains("location")));
    }

    #[tokio::test]
    async fn geocode_resolves_known_city() {
        let (status, body) = get_json(app(Ok(1.0)), "/api/geocode?location=Paris").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "latitude": "48.8566", "longitude": "2.3522" }));
    }

    #[tokio::test]
    async fn geocode_requires_location() {
        let (status, body) = get_json(app(Ok(1.0)), "/api/geocode").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Location parameter is required");
    }
}
