//! wgpu plumbing for the star viewer: device and surface ownership, surface
//! size normalization, the perspective camera, per-frame encoding and the
//! reference grid.

pub mod camera;
pub mod gpu;
pub mod grid;
pub mod pass;
pub mod surface;

pub use camera::Camera;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use grid::{GRID_SHADER_SOURCE, GridRenderer, GridSpec, GridVertex};
pub use pass::{FrameEncoder, RenderPassBuilder, SPACE_BLACK, clear_color_from_rgb};
pub use surface::{PhysicalSize, SurfaceWrapper};
