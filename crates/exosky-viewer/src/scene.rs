//! The star view: the viewer state plus the GPU resources that draw it.
//!
//! Per frame the host calls [`Scene::apply_input`], [`Scene::update`] and
//! [`Scene::render`] in that order. Stars are uploaded once per [`StarSet`]
//! generation and replaced wholesale when a new set arrives.

use crate::controls::ViewMode;
use crate::export::ChartExporter;
use crate::state::{ViewerEvent, ViewerState};
use exosky_config::Config;
use exosky_input::{KeyboardState, PointerState};
use exosky_render::{
    FrameEncoder, GridRenderer, RenderContext, RenderPassBuilder, SurfaceError,
    clear_color_from_rgb,
};
use exosky_stars::{
    BufferCache, DeviceRgb, RenderBuffers, SceneUniforms, SpriteSettings, StarCloud,
    StarRenderer, StarSet, StarStyle, peak_wavelength_nm, pick_star, star_texture,
};
use glam::Vec2;
use std::sync::Arc;
use std::time::Instant;

/// Hover radius around the cursor, in physical pixels.
const PICK_RADIUS_PX: f32 = 8.0;

/// Marker drawn at the planet's position in orbit view.
const PLANET_MARKER_COLOR: DeviceRgb = DeviceRgb([255.0, 40.0, 40.0]);
const PLANET_MARKER_SIZE: f32 = 2.0;

pub struct Scene {
    pub state: ViewerState,
    stars: StarSet,
    cache: BufferCache,
    cloud: Option<StarCloud>,
    marker: Option<StarCloud>,
    star_renderer: StarRenderer,
    grid: GridRenderer,
    sprites: SpriteSettings,
    pass: RenderPassBuilder,
    viewport: Vec2,
    hovered: Option<usize>,
}

impl Scene {
    pub fn new(
        gpu: &RenderContext,
        config: &Config,
        planet: &str,
        stars: StarSet,
        exporter: ChartExporter,
    ) -> Self {
        let state = ViewerState::new(planet, config, exporter);
        let render = &config.render;

        let sprites = SpriteSettings {
            size_scale: render.point_scale,
            min_point_px: render.min_point_px,
            max_point_px: render.max_point_px,
            fog_color: render.fog_color,
            fog_near: render.fog_near,
            fog_far: render.fog_far,
        };
        let style = StarStyle {
            star_size: render.star_size,
            ..StarStyle::default()
        };

        let star_renderer =
            StarRenderer::new(&gpu.device, &gpu.queue, gpu.surface_format, star_texture());
        let grid = GridRenderer::new(
            &gpu.device,
            gpu.surface_format,
            state.controls().profile().grid,
        );
        let marker = StarCloud::new(
            &gpu.device,
            "planet-marker",
            Arc::new(RenderBuffers {
                positions: vec![0.0; 3],
                colors: PLANET_MARKER_COLOR.0.to_vec(),
                sizes: vec![PLANET_MARKER_SIZE],
            }),
        );
        let (width, height) = gpu.size();

        let mut scene = Self {
            state,
            stars: StarSet::empty(),
            cache: BufferCache::new(style),
            cloud: None,
            marker,
            star_renderer,
            grid,
            sprites,
            pass: RenderPassBuilder::new()
                .clear_color(clear_color_from_rgb(render.background))
                .label("star-pass"),
            viewport: Vec2::new(width as f32, height as f32),
            hovered: None,
        };
        scene.set_stars(&gpu.device, stars);
        scene.resize(width, height);
        scene
    }

    /// Replace the star cloud. Buffers are rebuilt only for a new generation.
    pub fn set_stars(&mut self, device: &wgpu::Device, stars: StarSet) {
        let buffers = self.cache.get_or_build(&stars);
        let reuse = self
            .cloud
            .as_ref()
            .is_some_and(|cloud| Arc::ptr_eq(cloud.source(), &buffers));
        if !reuse {
            self.cloud = StarCloud::new(device, "stars", buffers);
            self.hovered = None;
        }
        tracing::info!(count = stars.len(), planet = self.state.planet(), "Star cloud ready");
        self.stars = stars;
    }

    pub fn stars(&self) -> &StarSet {
        &self.stars
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        self.state
            .camera
            .set_aspect_ratio(self.viewport.x, self.viewport.y);
    }

    /// Consume this frame's pointer and keyboard input.
    pub fn apply_input(
        &mut self,
        pointer: &mut PointerState,
        keyboard: &mut KeyboardState,
        now: Instant,
    ) -> Vec<ViewerEvent> {
        for gesture in pointer.drain_gestures() {
            self.state.handle_gesture(gesture, now);
        }
        self.state.handle_drag(pointer.take_drag_delta());

        keyboard
            .drain_actions()
            .into_iter()
            .filter_map(|action| self.state.handle_action(action, now))
            .collect()
    }

    /// Advance the simulation and refresh hover highlighting.
    pub fn update(
        &mut self,
        gpu: &RenderContext,
        pointer: &PointerState,
        dt: f32,
        now: Instant,
    ) -> Option<ViewerEvent> {
        let event = self.state.update(dt, now);
        self.grid
            .set_spec(&gpu.device, self.state.controls().profile().grid);
        self.update_hover(&gpu.queue, pointer);
        event
    }

    fn update_hover(&mut self, queue: &wgpu::Queue, pointer: &PointerState) {
        let Some(cloud) = self.cloud.as_mut() else {
            return;
        };
        let hovered = match pointer.position() {
            Some(cursor) if !pointer.is_dragging() => pick_star(
                cloud.source(),
                self.state.camera.view_projection_matrix(),
                self.viewport,
                cursor,
                PICK_RADIUS_PX,
            ),
            _ => None,
        };
        if hovered != self.hovered {
            if let Some(index) = hovered
                && let Some(star) = self.stars.stars().get(index)
            {
                tracing::debug!(
                    index,
                    luminosity = star.luminosity,
                    temperature = ?star.temperature,
                    peak_nm = ?star.temperature.map(peak_wavelength_nm),
                    wavelength = ?star.wavelength,
                    "Hovering star"
                );
            }
            self.hovered = hovered;
        }
        cloud.highlight(queue, hovered);
    }

    /// Draw one frame and record the camera it was drawn with.
    pub fn render(&mut self, gpu: &RenderContext) -> Result<(), SurfaceError> {
        let camera = &self.state.camera;
        let view = camera.view_matrix();
        let proj = camera.projection_matrix();
        self.star_renderer.update(
            &gpu.queue,
            &SceneUniforms::new(view, proj, self.viewport, &self.sprites),
        );
        self.grid.update(&gpu.queue, proj * view);

        let surface_texture = gpu.get_current_texture()?;
        let mut frame = FrameEncoder::new(&gpu.device, gpu.queue.clone(), surface_texture);
        if let Some(mut pass) = frame.begin_render_pass(&self.pass) {
            if self.state.show_grid() {
                self.grid.render(&mut pass);
            }
            if let Some(cloud) = &self.cloud {
                self.star_renderer.render(&mut pass, cloud);
            }
            if self.state.view_mode() == ViewMode::Orbit
                && let Some(marker) = &self.marker
            {
                self.star_renderer.render(&mut pass, marker);
            }
        }
        frame.submit();

        self.state.frame_rendered();
        Ok(())
    }

    /// Tear down timers before the scene is dropped or replaced.
    pub fn unmount(&mut self) {
        self.state.unmount();
    }
}
