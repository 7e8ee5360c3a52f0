//! Window size bookkeeping in physical pixels.
//!
//! Wayland can report a zero-size window before the compositor assigns one,
//! and HiDPI displays change the physical size without a logical resize. The
//! wrapper clamps to 1x1 and tracks whether a real size has arrived yet.

/// Minimum surface dimension.
pub const MIN_SURFACE_DIMENSION: u32 = 1;

/// Physical pixel dimensions of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

impl PhysicalSize {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(MIN_SURFACE_DIMENSION) as f32
    }

    pub fn as_vec2(&self) -> glam::Vec2 {
        glam::Vec2::new(self.width as f32, self.height as f32)
    }
}

/// Tracks the drawable size and scale factor of the window.
pub struct SurfaceWrapper {
    size: PhysicalSize,
    scale_factor: f64,
    /// Whether a non-zero size has been seen.
    configured: bool,
}

impl SurfaceWrapper {
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        Self {
            size: PhysicalSize {
                width: physical_width.max(MIN_SURFACE_DIMENSION),
                height: physical_height.max(MIN_SURFACE_DIMENSION),
            },
            scale_factor,
            configured: physical_width > 0 && physical_height > 0,
        }
    }

    /// Apply a window resize. Returns the new size only if it changed.
    pub fn handle_resize(&mut self, physical_width: u32, physical_height: u32) -> Option<PhysicalSize> {
        let size = PhysicalSize {
            width: physical_width.max(MIN_SURFACE_DIMENSION),
            height: physical_height.max(MIN_SURFACE_DIMENSION),
        };
        if physical_width > 0 && physical_height > 0 {
            self.configured = true;
        }
        if size == self.size {
            return None;
        }
        self.size = size;
        Some(size)
    }

    /// Apply a scale factor change, which usually comes with a new physical
    /// size for the same logical size.
    pub fn handle_scale_factor_changed(
        &mut self,
        scale_factor: f64,
        physical_width: u32,
        physical_height: u32,
    ) -> Option<PhysicalSize> {
        self.scale_factor = scale_factor;
        self.handle_resize(physical_width, physical_height)
    }

    pub fn physical_size(&self) -> PhysicalSize {
        self.size
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn logical_size(&self) -> (f64, f64) {
        (
            self.size.width as f64 / self.scale_factor,
            self.size.height as f64 / self.scale_factor,
        )
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_surface_handled_gracefully() {
        let mut wrapper = SurfaceWrapper::new(0, 0, 1.0);
        assert!(!wrapper.is_configured());
        assert_eq!(wrapper.physical_size(), PhysicalSize { width: 1, height: 1 });

        let size = wrapper.handle_resize(1920, 1080).unwrap();
        assert_eq!(size, PhysicalSize { width: 1920, height: 1080 });
        assert!(wrapper.is_configured());
    }

    #[test]
    fn test_no_event_on_same_dimensions() {
        let mut wrapper = SurfaceWrapper::new(1920, 1080, 1.0);
        assert!(wrapper.handle_resize(1920, 1080).is_none());
    }

    #[test]
    fn test_zero_dimensions_clamped_to_one() {
        let mut wrapper = SurfaceWrapper::new(800, 600, 1.0);
        assert!(wrapper.handle_resize(0, 0).is_some());
        assert_eq!(wrapper.physical_size(), PhysicalSize { width: 1, height: 1 });
        assert!(wrapper.is_configured(), "an earlier real size keeps it configured");
    }

    #[test]
    fn test_scale_factor_change_updates_physical_and_logical() {
        let mut wrapper = SurfaceWrapper::new(1920, 1080, 1.0);
        let size = wrapper.handle_scale_factor_changed(2.0, 3840, 2160).unwrap();
        assert_eq!(size.width, 3840);
        assert_eq!(wrapper.scale_factor(), 2.0);
        let (lw, lh) = wrapper.logical_size();
        assert!((lw - 1920.0).abs() < 0.1 && (lh - 1080.0).abs() < 0.1);
    }

    #[test]
    fn test_aspect_ratio() {
        let size = PhysicalSize { width: 1600, height: 900 };
        assert!((size.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(size.as_vec2(), glam::Vec2::new(1600.0, 900.0));
    }
}
