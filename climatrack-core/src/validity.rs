use crate::model::{MISSING_SENTINEL, RawObservationSet};

/// True when the primary (temperature) series holds at least one real value.
///
/// The upstream answers `200 OK` with `-999` placeholders when no ground
/// observation exists, so usability is judged on the payload alone.
pub fn is_usable(raw: &RawObservationSet) -> bool {
    raw.temperature
        .values()
        .any(|value| value.is_some_and(is_observation))
}

fn is_observation(value: f64) -> bool {
    value.is_finite() && value != MISSING_SENTINEL
}
