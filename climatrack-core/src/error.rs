use serde::Serialize;
use thiserror::Error;

/// Failures of a single upstream call. None of these are retried.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Invalid upstream request: {0}")]
    InvalidRequest(String),

    /// Transport failure (`status` is `None`) or a non-success HTTP status.
    #[error("{}", unavailable_message(.status))]
    Unavailable {
        status: Option<u16>,
        details: String,
    },

    /// Body did not match the `properties.parameter.T2M` envelope.
    #[error("Unexpected NASA POWER response format: {message}")]
    Format {
        message: String,
        raw: serde_json::Value,
    },
}

fn unavailable_message(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("NASA POWER API failed with status {code}"),
        None => "Failed to reach NASA POWER API".to_string(),
    }
}

/// Everything the retrieval endpoint can report as an error body.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Missing latitude, longitude, or date/date range parameters")]
    MissingParameter,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Wire shape of an error response: `{ error, details? }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl RetrievalError {
    /// HTTP status this error is surfaced with.
    pub fn status_code(&self) -> u16 {
        match self {
            RetrievalError::MissingParameter | RetrievalError::InvalidParameter(_) => 400,
            RetrievalError::Upstream(UpstreamError::InvalidRequest(_)) => 400,
            RetrievalError::Upstream(UpstreamError::Unavailable { status, .. }) => {
                status.filter(|s| (400..600).contains(s)).unwrap_or(502)
            }
            RetrievalError::Upstream(UpstreamError::Format { .. }) => 502,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let details = match self {
            RetrievalError::Upstream(UpstreamError::Unavailable { details, .. }) => {
                Some(serde_json::Value::String(details.clone()))
            }
            RetrievalError::Upstream(UpstreamError::Format { raw, .. }) => Some(raw.clone()),
            _ => None,
        };

        ErrorBody {
            error: self.to_string(),
            details,
        }
    }
}
