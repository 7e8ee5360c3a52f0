//! Star records to flat GPU-ready attribute arrays.
//!
//! Colors are converted from normalized to device range exactly once, here.
//! Everything downstream (instance buffers, hover highlight, shader input) sees
//! `[0, 255]` channels.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::color::{DeviceRgb, NormalizedRgb, VISIBLE_MAX_NM, VISIBLE_MIN_NM};
use crate::color::{temperature_to_rgb, wavelength_to_rgb, with_value};
use crate::record::{Generation, StarRecord, StarSet};

/// One solar radius expressed in scene units (parsecs scaled by 10 000).
pub const SOLAR_RADIUS_SCENE: f32 = 696_340.0 / 30_856_775_814_914.0 * 10_000.0;

/// Tunables for the color and size mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarStyle {
    /// Global size multiplier.
    pub star_size: f32,
    /// Scene-space length that maps to a display size of 1.
    pub radius_unit: f32,
    /// Radius used when a record has none, in scene units.
    pub fallback_radius: f32,
    /// Smallest size ever emitted.
    pub min_size: f32,
    /// Floor of the HSV value channel so dim stars stay visible.
    pub min_value: f32,
}

impl Default for StarStyle {
    fn default() -> Self {
        Self {
            star_size: 1.0,
            radius_unit: SOLAR_RADIUS_SCENE,
            fallback_radius: SOLAR_RADIUS_SCENE,
            min_size: 0.05,
            min_value: 0.2,
        }
    }
}

/// Flat per-instance attribute arrays, in the order of the input records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderBuffers {
    /// xyz per star.
    pub positions: Vec<f32>,
    /// Device-range rgb per star.
    pub colors: Vec<f32>,
    /// One size per star.
    pub sizes: Vec<f32>,
}

impl RenderBuffers {
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.positions
            .get(index * 3..index * 3 + 3)
            .map(Vec3::from_slice)
    }

    pub fn color(&self, index: usize) -> Option<DeviceRgb> {
        self.colors
            .get(index * 3..index * 3 + 3)
            .map(|c| DeviceRgb([c[0], c[1], c[2]]))
    }
}

/// Device-range color for one star.
///
/// Wavelength wins over temperature. Both are brightness-remapped through the
/// HSV value channel from luminosity. A star with neither is plain white.
pub fn star_color(star: &StarRecord, style: &StarStyle) -> Option<DeviceRgb> {
    let base: NormalizedRgb = if let Some(nm) = star.wavelength.filter(|w| w.is_finite()) {
        wavelength_to_rgb(nm.clamp(VISIBLE_MIN_NM, VISIBLE_MAX_NM))
    } else if let Some(kelvin) = star.temperature.filter(|t| t.is_finite()) {
        temperature_to_rgb(kelvin).to_normalized()
    } else {
        return None;
    };
    let value = (star.luminosity / 100.0).clamp(style.min_value, 1.0);
    Some(with_value(base, value).to_device())
}

/// Display size for one star: radius scaled up logarithmically by luminosity.
pub fn star_size(star: &StarRecord, style: &StarStyle) -> f32 {
    let radius = star
        .radius
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(style.fallback_radius);
    let lum = if star.luminosity.is_finite() {
        star.luminosity.max(0.0)
    } else {
        0.0
    };
    let boost = (lum + 1.0).log10() / 3.0 + 1.0;
    let size = radius / style.radius_unit * style.star_size * boost;
    if size.is_finite() {
        size.max(style.min_size)
    } else {
        style.min_size
    }
}

/// Build attribute arrays for `stars`. Linear in the number of stars.
pub fn build(stars: &[StarRecord], style: &StarStyle) -> RenderBuffers {
    let mut buffers = RenderBuffers {
        positions: Vec::with_capacity(stars.len() * 3),
        colors: Vec::with_capacity(stars.len() * 3),
        sizes: Vec::with_capacity(stars.len()),
    };
    let mut uncolored = 0usize;

    for (index, star) in stars.iter().enumerate() {
        buffers.positions.extend_from_slice(&star.position.to_array());

        let color = star_color(star, style).unwrap_or_else(|| {
            log::trace!("star {index} has no wavelength or temperature, drawing white");
            uncolored += 1;
            DeviceRgb::WHITE
        });
        buffers.colors.extend_from_slice(&color.0);

        buffers.sizes.push(star_size(star, style));
    }

    if uncolored > 0 {
        log::debug!(
            "{uncolored} of {} stars lack color input and are drawn white",
            stars.len()
        );
    }
    buffers
}

/// Memoizes [`build`] on the generation of the last star set seen.
#[derive(Debug, Default)]
pub struct BufferCache {
    style: StarStyle,
    entry: Option<(Generation, Arc<RenderBuffers>)>,
    builds: u64,
}

impl BufferCache {
    pub fn new(style: StarStyle) -> Self {
        Self {
            style,
            entry: None,
            builds: 0,
        }
    }

    /// Buffers for `set`, rebuilt only when its generation differs from the
    /// cached one.
    pub fn get_or_build(&mut self, set: &StarSet) -> Arc<RenderBuffers> {
        if let Some((generation, buffers)) = &self.entry
            && *generation == set.generation()
        {
            return Arc::clone(buffers);
        }

        let buffers = Arc::new(build(set.stars(), &self.style));
        self.builds += 1;
        log::debug!(
            "Built star buffers for generation {} ({} stars)",
            set.generation().get(),
            buffers.len()
        );
        self.entry = Some((set.generation(), Arc::clone(&buffers)));
        buffers
    }

    /// Change the style; a different style drops the cached buffers.
    pub fn set_style(&mut self, style: StarStyle) {
        if style != self.style {
            self.style = style;
            self.entry = None;
        }
    }

    pub fn style(&self) -> &StarStyle {
        &self.style
    }

    /// How many times buffers have actually been built.
    pub fn build_count(&self) -> u64 {
        self.builds
    }
}

/// Index of the star whose projection lies closest to `cursor`, within
/// `radius_px` pixels. `cursor` and `viewport` are in physical pixels with the
/// origin at the top-left.
pub fn pick_star(
    buffers: &RenderBuffers,
    view_proj: Mat4,
    viewport: Vec2,
    cursor: Vec2,
    radius_px: f32,
) -> Option<usize> {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return None;
    }

    let mut best: Option<(usize, f32)> = None;
    for (index, chunk) in buffers.positions.chunks_exact(3).enumerate() {
        let clip = view_proj * Vec3::from_slice(chunk).extend(1.0);
        if clip.w <= 0.0 {
            continue;
        }
        let ndc = clip.xy() / clip.w;
        let screen = Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        );
        let dist = screen.distance(cursor);
        if dist <= radius_px && best.is_none_or(|(_, d)| dist < d) {
            best = Some((index, dist));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_star() -> StarRecord {
        StarRecord::new(Vec3::new(1.0, 2.0, 3.0), 50.0)
            .with_temperature(5800.0)
            .with_radius(SOLAR_RADIUS_SCENE)
    }

    #[test]
    fn test_buffer_lengths_match_star_count() {
        let stars: Vec<_> = (0..10_000)
            .map(|i| {
                StarRecord::new(Vec3::splat(i as f32), (i % 300) as f32)
                    .with_temperature(2000.0 + (i % 20_000) as f32)
            })
            .collect();
        let buffers = build(&stars, &StarStyle::default());
        assert_eq!(buffers.positions.len(), 30_000);
        assert_eq!(buffers.colors.len(), 30_000);
        assert_eq!(buffers.sizes.len(), 10_000);
        assert_eq!(buffers.position(9_999), Some(Vec3::splat(9_999.0)));
    }

    #[test]
    fn test_positions_are_passed_through_in_order() {
        let stars = vec![
            StarRecord::new(Vec3::new(1.0, 2.0, 3.0), 1.0),
            StarRecord::new(Vec3::new(-4.0, 5.0, -6.0), 1.0),
        ];
        let buffers = build(&stars, &StarStyle::default());
        assert_eq!(buffers.positions, vec![1.0, 2.0, 3.0, -4.0, 5.0, -6.0]);
    }

    #[test]
    fn test_colors_are_in_device_range() {
        let stars = vec![
            sample_star(),
            StarRecord::new(Vec3::ZERO, 1e6).with_wavelength(500.0),
            StarRecord::new(Vec3::ZERO, 0.0).with_temperature(30_000.0),
        ];
        let buffers = build(&stars, &StarStyle::default());
        for &c in &buffers.colors {
            assert!((0.0..=255.0).contains(&c), "channel {c} outside device range");
        }
        assert!(
            buffers.colors.iter().any(|&c| c > 1.0),
            "colors should be scaled to device range, got {:?}",
            buffers.colors
        );
    }

    #[test]
    fn test_missing_color_input_is_white_with_positive_size() {
        let stars = vec![StarRecord::new(Vec3::ZERO, 3.0)];
        let buffers = build(&stars, &StarStyle::default());
        assert_eq!(buffers.color(0), Some(DeviceRgb::WHITE));
        assert!(buffers.sizes[0].is_finite() && buffers.sizes[0] > 0.0);
    }

    #[test]
    fn test_wavelength_takes_priority_over_temperature() {
        let both = StarRecord::new(Vec3::ZERO, 100.0)
            .with_wavelength(650.0)
            .with_temperature(30_000.0);
        let color = star_color(&both, &StarStyle::default()).unwrap();
        assert_eq!(color.0, [255.0, 0.0, 0.0]);
    }

    #[test]
    fn test_wavelength_is_clamped_to_visible_band() {
        let style = StarStyle::default();
        let infrared = StarRecord::new(Vec3::ZERO, 100.0).with_wavelength(2000.0);
        let deep_red = StarRecord::new(Vec3::ZERO, 100.0).with_wavelength(VISIBLE_MAX_NM);
        assert_eq!(star_color(&infrared, &style), star_color(&deep_red, &style));
        assert_ne!(star_color(&infrared, &style).unwrap().0, [0.0; 3]);
    }

    #[test]
    fn test_dim_wavelength_stars_keep_their_hue() {
        let style = StarStyle::default();
        let stars: Vec<_> = [450.0, 550.0, 650.0]
            .iter()
            .map(|&nm| StarRecord::new(Vec3::ZERO, 1.0).with_wavelength(nm))
            .collect();
        let buffers = build(&stars, &style);

        // blue, green, red
        for (index, dominant) in [2, 1, 0].into_iter().enumerate() {
            let rgb = buffers.color(index).unwrap().0;
            assert!(rgb.iter().any(|&c| c > 0.0), "star {index} is black");
            let brightest = (0..3).max_by(|&a, &b| rgb[a].total_cmp(&rgb[b])).unwrap();
            assert_eq!(brightest, dominant, "star {index} color {rgb:?}");
            let max = rgb.into_iter().fold(0.0, f32::max);
            assert!((max - style.min_value * 255.0).abs() < 1e-3, "star {index} max {max}");
        }
    }

    #[test]
    fn test_luminosity_drives_brightness_with_floor() {
        let style = StarStyle::default();
        let dim = StarRecord::new(Vec3::ZERO, 0.0).with_temperature(6500.0);
        let bright = StarRecord::new(Vec3::ZERO, 500.0).with_temperature(6500.0);
        let dim_max = star_color(&dim, &style).unwrap().0.into_iter().fold(0.0, f32::max);
        let bright_max = star_color(&bright, &style).unwrap().0.into_iter().fold(0.0, f32::max);
        assert!((dim_max - style.min_value * 255.0).abs() < 1e-3, "dim max {dim_max}");
        assert!((bright_max - 255.0).abs() < 1e-3, "bright max {bright_max}");
    }

    #[test]
    fn test_size_grows_with_luminosity() {
        let style = StarStyle::default();
        let faint = StarRecord::new(Vec3::ZERO, 0.0).with_radius(SOLAR_RADIUS_SCENE);
        let loud = StarRecord::new(Vec3::ZERO, 999.0).with_radius(SOLAR_RADIUS_SCENE);
        assert!((star_size(&faint, &style) - 1.0).abs() < 1e-4);
        assert!((star_size(&loud, &style) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_size_handles_bad_inputs() {
        let style = StarStyle::default();
        let negative = StarRecord::new(Vec3::ZERO, -10.0);
        let tiny = StarRecord::new(Vec3::ZERO, 0.0).with_radius(1e-12);
        assert!((star_size(&negative, &style) - 1.0).abs() < 1e-4);
        assert_eq!(star_size(&tiny, &style), style.min_size);
    }

    #[test]
    fn test_cache_hits_for_same_generation() {
        let mut cache = BufferCache::new(StarStyle::default());
        let set = StarSet::new(vec![sample_star()]);
        let first = cache.get_or_build(&set);
        let second = cache.get_or_build(&set.clone());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.build_count(), 1);
    }

    #[test]
    fn test_cache_rebuilds_for_new_set_with_equal_contents() {
        let mut cache = BufferCache::new(StarStyle::default());
        let a = StarSet::new(vec![sample_star()]);
        let b = StarSet::new(vec![sample_star()]);
        let first = cache.get_or_build(&a);
        let second = cache.get_or_build(&b);
        assert_eq!(cache.build_count(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_style_change_invalidates_cache() {
        let mut cache = BufferCache::new(StarStyle::default());
        let set = StarSet::new(vec![sample_star()]);
        cache.get_or_build(&set);
        cache.set_style(StarStyle::default());
        cache.get_or_build(&set);
        assert_eq!(cache.build_count(), 1, "identical style keeps the cache");

        cache.set_style(StarStyle {
            star_size: 2.0,
            ..StarStyle::default()
        });
        let rebuilt = cache.get_or_build(&set);
        assert_eq!(cache.build_count(), 2);
        assert!((rebuilt.sizes[0] - 2.0 * star_size(&sample_star(), &StarStyle::default())).abs() < 1e-4);
    }

    #[test]
    fn test_pick_star_returns_nearest_in_radius() {
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let stars = vec![
            StarRecord::new(Vec3::new(0.0, 0.0, -10.0), 1.0),
            StarRecord::new(Vec3::new(0.5, 0.0, -10.0), 1.0),
            StarRecord::new(Vec3::new(0.0, 0.0, 10.0), 1.0),
        ];
        let buffers = build(&stars, &StarStyle::default());
        let viewport = Vec2::new(800.0, 800.0);

        let center = Vec2::new(400.0, 400.0);
        assert_eq!(pick_star(&buffers, proj * view, viewport, center, 8.0), Some(0));

        // Star 1 projects 20 px to the right of center.
        let right = Vec2::new(419.0, 400.0);
        assert_eq!(pick_star(&buffers, proj * view, viewport, right, 8.0), Some(1));

        let empty_corner = Vec2::new(10.0, 10.0);
        assert_eq!(pick_star(&buffers, proj * view, viewport, empty_corner, 8.0), None);
    }
}
