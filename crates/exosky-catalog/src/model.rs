//! Wire types of the catalog service.

use exosky_stars::StarRecord;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A planet as listed by `/planets`. Everything but the name may be missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetRecord {
    pub pl_name: String,
    pub hostname: Option<String>,
    /// Right ascension in degrees.
    pub ra: Option<f64>,
    /// Declination in degrees.
    pub dec: Option<f64>,
    /// Distance to the system in parsecs.
    pub sy_dist: Option<f64>,
    /// Number of moons.
    pub sy_mnum: Option<u32>,
    pub disc_year: Option<i32>,
    pub disc_facility: Option<String>,
    /// Orbital period in days.
    pub pl_orbper: Option<f64>,
    /// Host star rotation period in days.
    pub st_rotp: Option<f64>,
    /// Planet radius in Earth radii.
    pub pl_rade: Option<f64>,
    /// Planet mass in Earth masses.
    pub pl_masse: Option<f64>,
}

/// One star as sent by `/planets/{name}/stars`. Absent values are `-1`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarWire {
    pub pos: [f32; 3],
    pub radius: Option<f32>,
    pub lum: Option<f32>,
    pub temperature: Option<f32>,
    pub mass: Option<f32>,
    pub age: Option<f32>,
    pub wavelength: Option<f32>,
}

/// `-1`, other non-positive values, NaN and missing fields all mean "unknown".
fn present(value: Option<f32>) -> Option<f32> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

impl From<StarWire> for StarRecord {
    fn from(wire: StarWire) -> Self {
        StarRecord {
            position: Vec3::from_array(wire.pos),
            luminosity: present(wire.lum).unwrap_or(0.0),
            temperature: present(wire.temperature),
            wavelength: present(wire.wavelength),
            radius: present(wire.radius),
            mass: present(wire.mass),
            age: present(wire.age),
        }
    }
}

/// Body of `POST /planets/chart`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub pl_name: String,
    /// Camera orientation as `[x, y, z, w]`.
    pub quaternion: [f32; 4],
    pub chart_size: u32,
}
