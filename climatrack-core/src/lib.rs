//! Core library for ClimaTrack.
//!
//! This crate defines:
//! - The NASA POWER daily point client and its provider trait
//! - Sentinel-aware validity checks and the backward-day fallback resolver
//! - Normalization into per-day records and the retrieval endpoint
//! - Configuration and the fixed city lookup table
//!
//! It is used by `climatrack-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod date;
pub mod endpoint;
pub mod error;
pub mod geocode;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod resolver;
pub mod validity;

pub use config::Config;
pub use date::DateStamp;
pub use endpoint::{RetrievalParams, RetrievalResponse, Retriever};
pub use error::{ErrorBody, RetrievalError, UpstreamError};
pub use geocode::CityTable;
pub use model::{Coordinate, DailyRecord, RawObservationSet, RetrievalResult};
pub use provider::{ObservationProvider, PowerClient};
pub use resolver::Resolution;
