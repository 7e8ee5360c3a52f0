//! Star visualization core: physical-to-visual color mapping, instance buffer
//! construction for large star clouds, the procedural glow sprite, and the
//! sprite pipeline that draws them.

pub mod buffers;
pub mod color;
pub mod record;
pub mod sprite;
pub mod texture;

pub use buffers::{
    BufferCache, RenderBuffers, SOLAR_RADIUS_SCENE, StarStyle, build, pick_star, star_color,
    star_size,
};
pub use color::{
    DeviceRgb, Hsv, NormalizedRgb, hsv_to_rgb, peak_wavelength_nm, rgb_to_hsv,
    temperature_to_rgb, wavelength_to_rgb, with_value,
};
pub use record::{Generation, StarRecord, StarSet};
pub use sprite::{
    HIGHLIGHT_COLOR, STAR_SHADER_SOURCE, SceneUniforms, SpriteSettings, StarCloud, StarRenderer,
};
pub use texture::{STAR_TEXTURE_SIZE, StarTexture, star_texture};
