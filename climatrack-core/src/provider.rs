use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    date::DateStamp,
    error::UpstreamError,
    model::{Coordinate, RawObservationSet},
};

pub mod power;

pub use power::PowerClient;

/// Source of raw daily observations for a single point.
///
/// One call is one upstream request; implementations never retry.
#[async_trait]
pub trait ObservationProvider: Send + Sync + Debug {
    /// Fetch the tracked parameters for the inclusive range `start..=end`.
    async fn fetch_range(
        &self,
        coordinate: &Coordinate,
        start: DateStamp,
        end: DateStamp,
    ) -> Result<RawObservationSet, UpstreamError>;
}
