//! JMA regional forecasts.
//!
//! Fetches the region catalog and per-region forecast documents from the
//! Japan Meteorological Agency, flattens them into [`ForecastRecord`]s and
//! keeps an append-only SQLite cache of them.

pub mod cache;
pub mod client;
pub mod error;
pub mod normalize;
pub mod service;
pub mod types;

pub use cache::ForecastCache;
pub use client::JmaClient;
pub use error::{ForecastError, ForecastResult};
pub use normalize::{normalize, normalize_daily};
pub use service::ForecastService;
pub use types::*;
