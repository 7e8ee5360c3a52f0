//! Procedural glow sprite shared by every star.
//!
//! The sprite is rasterized once per process: a wide soft halo plus a narrow
//! bright core, each drawn as a filled circle and gaussian-blurred, then added
//! together.

use std::sync::LazyLock;

use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};

/// Edge length of the generated sprite in pixels.
pub const STAR_TEXTURE_SIZE: u32 = 64;

static STAR_TEXTURE: LazyLock<StarTexture> =
    LazyLock::new(|| StarTexture::generate(STAR_TEXTURE_SIZE));

/// The process-wide glow sprite, generated on first access.
pub fn star_texture() -> &'static StarTexture {
    &STAR_TEXTURE
}

/// An RGBA8 glow sprite. Color and alpha both carry the glow intensity.
#[derive(Clone, Debug)]
pub struct StarTexture {
    image: RgbaImage,
}

struct Circle {
    radius: f32,
    blur_sigma: f32,
    intensity: f32,
}

const HALO: Circle = Circle {
    radius: 0.30,
    blur_sigma: 0.10,
    intensity: 0.55,
};

const CORE: Circle = Circle {
    radius: 0.07,
    blur_sigma: 0.03,
    intensity: 1.0,
};

impl StarTexture {
    /// Rasterize a `size` x `size` sprite. Circle radii and blur are relative to
    /// the sprite size.
    pub fn generate(size: u32) -> Self {
        let size = size.max(4);
        let halo = blurred_circle(size, &HALO);
        let core = blurred_circle(size, &CORE);

        let image = RgbaImage::from_fn(size, size, |x, y| {
            let sum = halo.get_pixel(x, y)[0] as u16 + core.get_pixel(x, y)[0] as u16;
            let v = sum.min(255) as u8;
            Rgba([v, v, v, v])
        });

        Self { image }
    }

    pub fn size(&self) -> u32 {
        self.image.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Tightly packed RGBA8 rows, ready for `Queue::write_texture`.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Glow intensity in `[0, 1]` at pixel `(x, y)`.
    pub fn intensity(&self, x: u32, y: u32) -> f32 {
        self.image.get_pixel(x, y)[3] as f32 / 255.0
    }
}

fn blurred_circle(size: u32, circle: &Circle) -> GrayImage {
    let center = size as f32 * 0.5;
    let radius = circle.radius * size as f32;
    let level = (circle.intensity * 255.0).round() as u8;

    let disc = GrayImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        if dx * dx + dy * dy <= radius * radius {
            Luma([level])
        } else {
            Luma([0])
        }
    });
    imageops::blur(&disc, circle.blur_sigma * size as f32)
}
