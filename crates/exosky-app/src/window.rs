//! Window creation and event handling via winit.
//!
//! [`App`] implements winit's [`ApplicationHandler`]: it owns the window, the
//! GPU context, input trackers, the active [`Screen`] and the notification
//! queue, and drives one frame per `RedrawRequested`.

use crate::fetch::{FetchResult, Fetcher, RequestId, describe_planet};
use crate::notify::{Level, Notifications};
use crate::platform::PlatformDirs;
use crate::screen::{Screen, Selection, SelectionKey, SelectionOutcome};
use exosky_catalog::CatalogClient;
use exosky_config::Config;
use exosky_input::{KeyBindings, KeyboardState, PointerState};
use exosky_render::{
    FrameEncoder, RenderContext, RenderPassBuilder, SurfaceError, SurfaceWrapper,
    clear_color_from_rgb, init_render_context_blocking,
};
use exosky_stars::StarSet;
use exosky_viewer::{ChartExporter, Scene, ViewerEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

/// Longest frame step fed to the controls, so a stall does not fling the
/// camera.
const MAX_FRAME_DT: f32 = 0.25;

/// How the app was asked to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartRequest {
    /// Open this planet directly.
    Planet(String),
    /// Search and open the first match.
    Search(String),
    /// Show the selection screen.
    Select,
}

pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Frame counter logged once per second when `debug.show_fps` is set.
struct FrameStats {
    enabled: bool,
    frames: u32,
    window_start: Instant,
}

impl FrameStats {
    fn tick(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            info!(
                fps = self.frames as f64 / elapsed.as_secs_f64(),
                "Frame rate"
            );
            self.frames = 0;
            self.window_start = now;
        }
    }
}

pub struct App {
    config: Config,
    dirs: PlatformDirs,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    surface: SurfaceWrapper,
    pointer: PointerState,
    keyboard: KeyboardState,
    screen: Screen,
    /// Selection to return to when leaving the star view or when loading fails.
    last_selection: Selection,
    fetcher: Fetcher,
    notifications: Notifications,
    start: Option<StartRequest>,
    open_first_match: bool,
    last_frame: Instant,
    stats: FrameStats,
    title: String,
}

impl App {
    pub fn new(config: Config, dirs: PlatformDirs, start: StartRequest) -> Self {
        let client = CatalogClient::from_config(&config.catalog);
        let now = Instant::now();
        Self {
            surface: SurfaceWrapper::new(config.window.width, config.window.height, 1.0),
            stats: FrameStats {
                enabled: config.debug.show_fps,
                frames: 0,
                window_start: now,
            },
            title: config.window.title.clone(),
            config,
            dirs,
            window: None,
            gpu: None,
            pointer: PointerState::new(),
            keyboard: KeyboardState::new(KeyBindings::default()),
            screen: Screen::Selecting(Selection::default()),
            last_selection: Selection::default(),
            fetcher: Fetcher::new(client),
            notifications: Notifications::default(),
            start: Some(start),
            open_first_match: false,
            last_frame: now,
        }
    }

    fn begin(&mut self, start: StartRequest, now: Instant) {
        match start {
            StartRequest::Planet(planet) => self.open_planet(planet, now),
            StartRequest::Search(query) => {
                self.open_first_match = true;
                self.screen = Screen::Selecting(Selection::with_query(query, now));
            }
            StartRequest::Select => {}
        }
    }

    fn open_planet(&mut self, planet: String, now: Instant) {
        let request = self.fetcher.stars(&planet);
        self.start_loading(planet, request, now);
    }

    fn start_loading(&mut self, planet: String, request: std::io::Result<RequestId>, now: Instant) {
        match request {
            Ok(request) => {
                self.notifications
                    .info(format!("Loading stars around {planet}"), now);
                self.leave_current_screen();
                self.screen = Screen::Loading { planet, request };
            }
            Err(e) => {
                self.notifications
                    .error(format!("Could not load stars for {planet}: {e}"), now);
                self.back_to_selection();
            }
        }
    }

    /// Tear down the star view, if that is what is showing.
    fn leave_current_screen(&mut self) {
        if let Screen::Viewing(scene) = &mut self.screen {
            scene.unmount();
        }
    }

    fn back_to_selection(&mut self) {
        self.leave_current_screen();
        self.screen = Screen::Selecting(self.last_selection.clone());
        self.keyboard.release_all();
    }

    fn make_exporter(&self) -> ChartExporter {
        let source = Arc::new(self.fetcher.client().clone());
        match ChartExporter::from_config(source.clone(), &self.config.export) {
            Ok(exporter) => exporter,
            Err(e) => {
                let dir = self.dirs.fallback_chart_dir();
                warn!("{e}; charts will be saved to {}", dir.display());
                ChartExporter::new(source, self.config.export.chart_size, dir)
            }
        }
    }

    fn handle_fetch(&mut self, result: FetchResult, now: Instant) {
        match result {
            FetchResult::Matches { query, result } => {
                let Screen::Selecting(selection) = &mut self.screen else {
                    return;
                };
                match result {
                    Ok(names) => {
                        debug!(query, matches = names.len(), "Search results");
                        let first = names.first().cloned();
                        if selection.set_matches(&query, names)
                            && self.open_first_match
                            && let Some(planet) = first
                        {
                            self.open_first_match = false;
                            self.last_selection = selection.clone();
                            self.open_planet(planet, now);
                        }
                    }
                    Err(e) => self.notifications.error(format!("Search failed: {e}"), now),
                }
            }
            FetchResult::Stars {
                id,
                planet,
                result,
                info,
            } => {
                let current = matches!(
                    &self.screen,
                    Screen::Loading { request, .. } if *request == id
                );
                if !current {
                    debug!(planet, "Dropping superseded star list");
                    return;
                }
                match result {
                    Ok(stars) => self.show_stars(planet, StarSet::new(stars), info, now),
                    Err(e) => {
                        self.notifications
                            .error(format!("Could not load stars for {planet}: {e}"), now);
                        self.back_to_selection();
                    }
                }
            }
        }
    }

    fn show_stars(
        &mut self,
        planet: String,
        stars: StarSet,
        info: Option<exosky_catalog::PlanetRecord>,
        now: Instant,
    ) {
        let Some(gpu) = &self.gpu else {
            self.notifications.error(
                format!("Cannot show {planet}: the GPU is not ready"),
                now,
            );
            self.back_to_selection();
            return;
        };
        let exporter = self.make_exporter();
        if stars.is_empty() {
            self.notifications
                .info(format!("The catalog has no stars around {planet}"), now);
        }
        if let Some(info) = info {
            self.notifications.info(describe_planet(&info), now);
        }

        let mut scene = Scene::new(gpu, &self.config, &planet, stars, exporter);
        let size = self.surface.physical_size();
        scene.resize(size.width, size.height);
        self.keyboard.release_all();
        self.keyboard.drain_actions();
        self.pointer.drain_gestures();
        self.screen = Screen::Viewing(Box::new(scene));
    }

    fn handle_viewer_event(&mut self, event: ViewerEvent, event_loop: &ActiveEventLoop, now: Instant) {
        match event {
            ViewerEvent::ExportStarted => self.notifications.info("Exporting sky chart", now),
            ViewerEvent::ExportBusy => debug!("Chart export already running"),
            ViewerEvent::ExportSkipped => {}
            ViewerEvent::ExportSaved(path) => self
                .notifications
                .info(format!("Chart saved to {}", path.display()), now),
            ViewerEvent::ExportFailed(e) => self
                .notifications
                .error(format!("Chart export failed: {e}"), now),
            ViewerEvent::Back => self.back_to_selection(),
            ViewerEvent::Quit => event_loop.exit(),
        }
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop, now: Instant) {
        match &mut self.screen {
            Screen::Viewing(_) => self.keyboard.process_event(event),
            Screen::Loading { .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    info!("Loading cancelled");
                    self.back_to_selection();
                }
            }
            Screen::Selecting(selection) => {
                if event.state != ElementState::Pressed {
                    return;
                }
                let keys: Vec<SelectionKey> = match &event.logical_key {
                    Key::Named(NamedKey::Escape) => {
                        event_loop.exit();
                        return;
                    }
                    Key::Named(NamedKey::Enter) => vec![SelectionKey::Submit],
                    Key::Named(NamedKey::Backspace) => vec![SelectionKey::Backspace],
                    Key::Named(NamedKey::Tab | NamedKey::ArrowDown) => vec![SelectionKey::Next],
                    Key::Named(NamedKey::ArrowUp) => vec![SelectionKey::Previous],
                    _ => event
                        .text
                        .as_ref()
                        .map(|text| text.chars().map(SelectionKey::Char).collect())
                        .unwrap_or_default(),
                };
                for key in keys {
                    if let SelectionOutcome::Open(planet) = selection.apply_key(key, now) {
                        self.last_selection = selection.clone();
                        self.open_planet(planet, now);
                        return;
                    }
                }
            }
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame = now;

        for result in self.fetcher.drain() {
            self.handle_fetch(result, now);
        }
        if let Screen::Selecting(selection) = &mut self.screen
            && let Some(query) = selection.take_due_search(now)
            && let Err(e) = self.fetcher.search(&query)
        {
            self.notifications.error(format!("Search failed: {e}"), now);
        }
        self.notifications.expire(now);

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let mut events = Vec::new();
        let rendered = match &mut self.screen {
            Screen::Viewing(scene) => {
                events = scene.apply_input(&mut self.pointer, &mut self.keyboard, now);
                events.extend(scene.update(gpu, &self.pointer, dt, now));
                scene.render(gpu)
            }
            _ => {
                self.pointer.drain_gestures();
                render_idle(gpu, &self.config)
            }
        };
        self.pointer.clear_transients();

        match rendered {
            Ok(()) => self.stats.tick(now),
            Err(SurfaceError::Timeout) => debug!("Surface timeout, frame skipped"),
            Err(SurfaceError::Lost) => {
                let size = self.surface.physical_size();
                gpu.resize(size.width, size.height);
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory, shutting down");
                event_loop.exit();
            }
        }

        for event in events {
            self.handle_viewer_event(event, event_loop, now);
        }
        self.update_title();
    }

    fn update_title(&mut self) {
        let base = match &self.screen {
            Screen::Selecting(selection) => selection.status(),
            Screen::Loading { planet, .. } => format!("Loading {planet}..."),
            Screen::Viewing(scene) => {
                let state = &scene.state;
                format!(
                    "{} ({} stars, {:?} view{}{})",
                    state.planet(),
                    scene.stars().len(),
                    state.view_mode(),
                    if state.rotation().is_rotating() { ", rotating" } else { "" },
                    if state.export_busy() { ", exporting" } else { "" },
                )
            }
        };
        let title = match self.notifications.latest() {
            Some(n) if n.level == Level::Error => format!("{base} | error: {}", n.message),
            Some(n) => format!("{base} | {}", n.message),
            None => base,
        };
        let title = format!("{} - {title}", self.config.window.title);
        if title != self.title
            && let Some(window) = &self.window
        {
            window.set_title(&title);
            self.title = title;
        }
    }

    fn handle_resize(&mut self, width: u32, height: u32, scale_factor: Option<f64>) {
        let resized = match scale_factor {
            Some(scale) => self.surface.handle_scale_factor_changed(scale, width, height),
            None => self.surface.handle_resize(width, height),
        };
        let Some(size) = resized else {
            return;
        };
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(size.width, size.height);
        }
        if let Screen::Viewing(scene) = &mut self.screen {
            scene.resize(size.width, size.height);
        }
        debug!(
            "Window resized to {}x{} (scale: {:.2})",
            size.width,
            size.height,
            self.surface.scale_factor()
        );
    }
}

/// Clear-only frame for the selection and loading screens.
fn render_idle(gpu: &RenderContext, config: &Config) -> Result<(), SurfaceError> {
    let surface_texture = gpu.get_current_texture()?;
    let mut frame = FrameEncoder::new(&gpu.device, gpu.queue.clone(), surface_texture);
    let builder = RenderPassBuilder::new()
        .clear_color(clear_color_from_rgb(config.render.background))
        .label("idle-pass");
    drop(frame.begin_render_pass(&builder));
    frame.submit();
    Ok(())
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let inner = window.inner_size();
        self.surface = SurfaceWrapper::new(inner.width, inner.height, window.scale_factor());
        info!(
            "Window created: {}x{} (scale: {:.2})",
            inner.width,
            inner.height,
            window.scale_factor()
        );

        match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        }
        self.window = Some(window);

        if let Some(start) = self.start.take() {
            self.begin(start, Instant::now());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.leave_current_screen();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.handle_resize(size.width, size.height, None),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(window) = &self.window {
                    let inner = window.inner_size();
                    self.handle_resize(inner.width, inner.height, Some(scale_factor));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => self.pointer.on_cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => self.pointer.on_button(button, state),
            WindowEvent::MouseWheel { delta, .. } => self.pointer.on_scroll(delta),
            WindowEvent::Focused(false) => {
                self.pointer.on_focus_lost();
                self.keyboard.release_all();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(&event, event_loop, Instant::now());
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Create the event loop and run until the window closes.
pub fn run(
    config: Config,
    dirs: PlatformDirs,
    start: StartRequest,
) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, dirs, start);
    event_loop.run_app(&mut app)
}
