//! Viewer logic without GPU resources: input mapping, camera controls,
//! rotation arbitration, the camera snapshot and chart export.

use crate::controls::{OrbitControls, ViewMode};
use crate::export::{ChartExporter, ExportError, ExportStart};
use crate::rotation::{RotationController, RotationEvent};
use crate::tracker::{CameraSnapshot, CameraTracker};
use exosky_config::Config;
use exosky_input::{PointerGesture, ViewerAction};
use exosky_render::Camera;
use glam::Vec2;
use std::path::PathBuf;
use std::time::Instant;

/// Things the viewer reports to its host.
#[derive(Debug)]
pub enum ViewerEvent {
    ExportStarted,
    ExportBusy,
    /// Export requested before any frame was drawn. Nothing was sent.
    ExportSkipped,
    ExportSaved(PathBuf),
    ExportFailed(ExportError),
    /// Return to planet selection.
    Back,
    Quit,
}

pub struct ViewerState {
    planet: String,
    pub camera: Camera,
    controls: OrbitControls,
    rotation: RotationController,
    tracker: CameraTracker,
    snapshot: CameraSnapshot,
    exporter: ChartExporter,
    show_grid: bool,
    dragging: bool,
}

impl ViewerState {
    pub fn new(planet: impl Into<String>, config: &Config, exporter: ChartExporter) -> Self {
        let tracker = CameraTracker::new();
        let snapshot = tracker.reader();
        let mode = ViewMode::from(config.viewer.start_view);
        let controls = OrbitControls::new(mode, &config.viewer);
        let mut camera = Camera {
            aspect_ratio: config.window.width as f32 / config.window.height.max(1) as f32,
            ..Camera::default()
        };
        controls.apply(&mut camera);

        Self {
            planet: planet.into(),
            camera,
            controls,
            rotation: RotationController::new(config.viewer.auto_rotate, config.resume_delay()),
            tracker,
            snapshot,
            exporter,
            show_grid: config.render.show_grid,
            dragging: false,
        }
    }

    pub fn planet(&self) -> &str {
        &self.planet
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn rotation(&self) -> &RotationController {
        &self.rotation
    }

    pub fn view_mode(&self) -> ViewMode {
        self.controls.mode()
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn snapshot(&self) -> CameraSnapshot {
        self.snapshot.clone()
    }

    pub fn export_busy(&self) -> bool {
        self.exporter.is_busy()
    }

    /// Pointer gestures: drags pause rotation for their duration, wheel
    /// zooms count as a momentary interaction. The wheel is ignored while a
    /// drag is held.
    pub fn handle_gesture(&mut self, gesture: PointerGesture, now: Instant) {
        match gesture {
            PointerGesture::DragStart => {
                self.dragging = true;
                self.rotation.handle(RotationEvent::InteractionStart, now);
            }
            PointerGesture::DragEnd => {
                self.dragging = false;
                self.rotation.handle(RotationEvent::InteractionEnd, now);
            }
            PointerGesture::Wheel(_) if self.dragging => {}
            PointerGesture::Wheel(lines) => {
                if self.controls.zoom(lines) {
                    self.rotation.handle(RotationEvent::InteractionStart, now);
                    self.rotation.handle(RotationEvent::InteractionEnd, now);
                }
            }
        }
    }

    pub fn handle_drag(&mut self, delta: Vec2) {
        if delta != Vec2::ZERO {
            self.controls.drag(delta);
        }
    }

    pub fn handle_action(&mut self, action: ViewerAction, now: Instant) -> Option<ViewerEvent> {
        match action {
            ViewerAction::ToggleRotation => {
                let state = self.rotation.handle(RotationEvent::ButtonToggle, now);
                tracing::info!(?state, "Rotation toggled");
                None
            }
            ViewerAction::ToggleGrid => {
                self.show_grid = !self.show_grid;
                None
            }
            ViewerAction::ToggleView => {
                self.controls.set_mode(self.controls.mode().toggled());
                None
            }
            ViewerAction::ExportChart => Some(self.request_export()),
            ViewerAction::Back => Some(ViewerEvent::Back),
            ViewerAction::Quit => Some(ViewerEvent::Quit),
        }
    }

    fn request_export(&mut self) -> ViewerEvent {
        match self.exporter.request(&self.planet, &self.snapshot) {
            Ok(ExportStart::Started) => ViewerEvent::ExportStarted,
            Ok(ExportStart::Busy) => ViewerEvent::ExportBusy,
            Ok(ExportStart::NoSnapshot) => ViewerEvent::ExportSkipped,
            Err(e) => ViewerEvent::ExportFailed(e),
        }
    }

    /// Advance timers and controls by `dt` seconds and move the camera.
    pub fn update(&mut self, dt: f32, now: Instant) -> Option<ViewerEvent> {
        self.rotation.poll(now);
        self.controls.update(dt, self.rotation.is_rotating());
        self.controls.apply(&mut self.camera);

        self.exporter.poll().map(|result| match result {
            Ok(path) => ViewerEvent::ExportSaved(path),
            Err(e) => ViewerEvent::ExportFailed(e),
        })
    }

    /// Record the camera as drawn this frame.
    pub fn frame_rendered(&self) {
        self.tracker.record(&self.camera);
    }

    /// Stop rotation timers. The state is inert afterwards.
    pub fn unmount(&mut self) {
        self.rotation.unmount();
    }
}
