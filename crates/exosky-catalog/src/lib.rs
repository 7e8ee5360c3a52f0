//! Blocking HTTP client for the exoplanet catalog service: planet search,
//! per-planet star lists and server-rendered sky charts.

mod client;
mod error;
mod model;

pub use client::{CatalogClient, ChartImage, encode_path_segment};
pub use error::CatalogError;
pub use model::{ChartRequest, PlanetRecord, StarWire};
