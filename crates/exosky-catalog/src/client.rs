use std::io::Read;
use std::time::Duration;

use exosky_config::CatalogConfig;
use exosky_stars::StarRecord;

use crate::error::CatalogError;
use crate::model::{ChartRequest, PlanetRecord, StarWire};

/// Image bytes returned by the chart endpoint, with their detected format.
#[derive(Clone, Debug)]
pub struct ChartImage {
    pub bytes: Vec<u8>,
    pub format: image::ImageFormat,
}

impl ChartImage {
    /// Preferred file extension for the detected format.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

/// Blocking client for the catalog service. Cheap to clone; clones share the
/// connection pool.
#[derive(Clone, Debug)]
pub struct CatalogClient {
    agent: ureq::Agent,
    base_url: String,
    star_limit: u32,
    trunk_halfheight: f32,
    search_count: u32,
}

impl CatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let defaults = CatalogConfig::default();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            star_limit: defaults.star_limit,
            trunk_halfheight: defaults.trunk_halfheight,
            search_count: defaults.search_count,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            star_limit: config.star_limit,
            trunk_halfheight: config.trunk_halfheight,
            search_count: config.search_count,
            ..Self::new(&config.base_url, Duration::from_secs(config.timeout_seconds))
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Planets whose name contains `query` (case-insensitive on the server).
    pub fn search_planets(&self, query: &str) -> Result<Vec<PlanetRecord>, CatalogError> {
        let url = format!("{}/planets", self.base_url);
        let response = self
            .agent
            .get(&url)
            .query("query", query)
            .query("count", &self.search_count.to_string())
            .call()
            .map_err(|e| CatalogError::from_ureq(&url, e))?;
        let planets: Vec<PlanetRecord> = response
            .into_json()
            .map_err(|e| CatalogError::decode(&url, e))?;
        log::debug!("Search {query:?} returned {} planets", planets.len());
        Ok(planets)
    }

    /// Planet names only, for autocompletion.
    pub fn planet_names(&self, query: &str) -> Result<Vec<String>, CatalogError> {
        let url = format!("{}/planets/names", self.base_url);
        let response = self
            .agent
            .get(&url)
            .query("query", query)
            .query("count", &self.search_count.to_string())
            .call()
            .map_err(|e| CatalogError::from_ureq(&url, e))?;
        response
            .into_json()
            .map_err(|e| CatalogError::decode(&url, e))
    }

    /// Stars around `planet`, with wire sentinels decoded into `Option`s.
    pub fn stars(&self, planet: &str) -> Result<Vec<StarRecord>, CatalogError> {
        let url = format!(
            "{}/planets/{}/stars",
            self.base_url,
            encode_path_segment(planet)
        );
        let response = self
            .agent
            .get(&url)
            .query("limit", &self.star_limit.to_string())
            .query("trunk_halfheight", &self.trunk_halfheight.to_string())
            .call()
            .map_err(|e| CatalogError::from_ureq(&url, e))?;
        let wire: Vec<StarWire> = response
            .into_json()
            .map_err(|e| CatalogError::decode(&url, e))?;
        log::info!("Fetched {} stars for {planet}", wire.len());
        Ok(wire.into_iter().map(StarRecord::from).collect())
    }

    /// Ask the server to render a sky chart. Fails with
    /// [`CatalogError::NotAnImage`] unless the body is a known image format.
    pub fn chart(&self, request: &ChartRequest) -> Result<ChartImage, CatalogError> {
        let url = format!("{}/planets/chart", self.base_url);
        let response = self
            .agent
            .post(&url)
            .send_json(request)
            .map_err(|e| CatalogError::from_ureq(&url, e))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| CatalogError::decode(&url, e))?;

        let format = image::guess_format(&bytes)
            .map_err(|_| CatalogError::NotAnImage { url: url.clone() })?;
        log::debug!("Chart for {} is {} bytes of {format:?}", request.pl_name, bytes.len());
        Ok(ChartImage { bytes, format })
    }
}

/// Percent-encode `segment` for use as a single URL path segment.
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
