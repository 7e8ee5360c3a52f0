//! Star records as fetched from the catalog and the generation-tagged set the
//! renderer caches on.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;

/// One star around the selected planet.
#[derive(Clone, Debug, PartialEq)]
pub struct StarRecord {
    /// Scene-space position; the planet sits at the origin.
    pub position: Vec3,
    /// Luminosity relative to the Sun. Negative values are treated as zero.
    pub luminosity: f32,
    /// Effective temperature in Kelvin.
    pub temperature: Option<f32>,
    /// Dominant emission wavelength in nanometres.
    pub wavelength: Option<f32>,
    /// Radius in scene units.
    pub radius: Option<f32>,
    /// Mass in solar masses. Carried for display only.
    pub mass: Option<f32>,
    /// Age in gigayears. Carried for display only.
    pub age: Option<f32>,
}

impl StarRecord {
    /// A record with only a position and luminosity.
    pub fn new(position: Vec3, luminosity: f32) -> Self {
        Self {
            position,
            luminosity,
            temperature: None,
            wavelength: None,
            radius: None,
            mass: None,
            age: None,
        }
    }

    pub fn with_temperature(mut self, kelvin: f32) -> Self {
        self.temperature = Some(kelvin);
        self
    }

    pub fn with_wavelength(mut self, nm: f32) -> Self {
        self.wavelength = Some(nm);
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }
}

/// Identifies one fetched star list. Two sets compare equal by generation only
/// if one is a clone of the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

impl Generation {
    fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// An immutable star list tagged with a process-unique generation.
///
/// Clones share both the records and the generation, so caches keyed on the
/// generation hit for the same list and miss for every newly built one, even
/// when the contents happen to be equal.
#[derive(Clone, Debug)]
pub struct StarSet {
    generation: Generation,
    stars: Arc<[StarRecord]>,
}

impl StarSet {
    pub fn new(stars: Vec<StarRecord>) -> Self {
        Self {
            generation: Generation::next(),
            stars: stars.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn stars(&self) -> &[StarRecord] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

impl From<Vec<StarRecord>> for StarSet {
    fn from(stars: Vec<StarRecord>) -> Self {
        Self::new(stars)
    }
}
