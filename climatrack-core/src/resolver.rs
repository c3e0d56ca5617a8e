//! Day-stepping fallback around the upstream client.
//!
//! The upstream answers successfully with `-999` placeholders when it has no
//! ground observation for a day. The resolver treats that as "try the day
//! before" and walks backwards until it finds a usable day or the budget runs
//! out. Transport and format failures are never absorbed by the budget.

use tracing::{debug, info, instrument};

use crate::{
    date::DateStamp,
    error::UpstreamError,
    model::{Coordinate, RetrievalResult},
    normalize::normalize,
    provider::ObservationProvider,
    validity::is_usable,
};

/// Fetch budget used when none is configured.
pub const DEFAULT_MAX_STEPS: u32 = 3;

/// Outcome of a retrieval that reached the upstream without failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(RetrievalResult),
    /// Every fetched window held only placeholders.
    Exhausted {
        target: DateStamp,
        last_tried: DateStamp,
        attempts: u32,
    },
}

/// Resolve a single-day query with backward fallback.
///
/// `max_steps` is the total number of single-day fetches, the target day
/// included, so at most `max_steps - 1` backward steps are taken. A budget of
/// zero still tries the target day once.
#[instrument(skip(provider, coordinate), fields(lat = %coordinate.latitude, lon = %coordinate.longitude))]
pub async fn resolve(
    provider: &dyn ObservationProvider,
    coordinate: &Coordinate,
    target: DateStamp,
    max_steps: u32,
) -> Result<Resolution, UpstreamError> {
    let attempts_allowed = max_steps.max(1);
    let mut candidate = target;
    let mut steps = 0;

    loop {
        let raw = provider.fetch_range(coordinate, candidate, candidate).await?;

        if is_usable(&raw) {
            info!(used_date = %candidate, fallback_steps = steps, "Found usable observation");
            return Ok(Resolution::Found(RetrievalResult {
                coordinate: coordinate.clone(),
                used_date: candidate,
                records: normalize(&raw),
                fallback_steps: steps,
            }));
        }

        if steps + 1 >= attempts_allowed {
            info!(attempts = steps + 1, last_tried = %candidate, "No usable observation within budget");
            return Ok(Resolution::Exhausted {
                target,
                last_tried: candidate,
                attempts: steps + 1,
            });
        }

        debug!(date = %candidate, "Only placeholder values, stepping back one day");
        candidate = candidate.previous_day();
        steps += 1;
    }
}

/// Resolve a range query. Ranges get a single fetch and no fallback.
#[instrument(skip(provider, coordinate), fields(lat = %coordinate.latitude, lon = %coordinate.longitude))]
pub async fn resolve_range(
    provider: &dyn ObservationProvider,
    coordinate: &Coordinate,
    start: DateStamp,
    end: DateStamp,
) -> Result<Resolution, UpstreamError> {
    let raw = provider.fetch_range(coordinate, start, end).await?;

    if !is_usable(&raw) {
        info!("No usable observation in range");
        return Ok(Resolution::Exhausted {
            target: start,
            last_tried: start,
            attempts: 1,
        });
    }

    Ok(Resolution::Found(RetrievalResult {
        coordinate: coordinate.clone(),
        used_date: start,
        records: normalize(&raw),
        fallback_steps: 0,
    }))
}
