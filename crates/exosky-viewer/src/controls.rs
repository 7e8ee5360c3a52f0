//! Orbit camera controls around the planet at the origin.
//!
//! Drag adds angular velocity that decays by `damping` each frame, the wheel
//! scales the orbit distance when zoom is enabled for the current
//! [`ViewMode`], and auto-rotation advances yaw at a constant rate.

use exosky_config::{StartView, ViewerConfig};
use exosky_render::{Camera, GridSpec};
use glam::{Vec2, Vec3};

/// Highest orbit elevation; keeps the look-at basis away from the pole.
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Velocity below which inertia is considered settled.
const SETTLED_VELOCITY: f32 = 1e-5;

/// Reference frame rate the per-frame damping factor is expressed at.
const DAMPING_REFERENCE_FPS: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Standing on the planet looking out at its sky.
    Ground,
    /// Looking at the planet and its neighbourhood from outside.
    Orbit,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Ground => ViewMode::Orbit,
            ViewMode::Orbit => ViewMode::Ground,
        }
    }

    /// Distance limits, zoom and grid placement for this mode.
    pub fn profile(self) -> ViewProfile {
        match self {
            ViewMode::Ground => ViewProfile {
                initial_distance: 0.001,
                min_distance: 0.0005,
                max_distance: 0.001,
                zoom_enabled: false,
                grid: GridSpec::default(),
            },
            ViewMode::Orbit => ViewProfile {
                initial_distance: 50_000.0,
                min_distance: 1_000.0,
                max_distance: 1_000_000.0,
                zoom_enabled: true,
                grid: GridSpec {
                    half_extent: 200_000.0,
                    divisions: 40,
                    y: 0.0,
                    ..GridSpec::default()
                },
            },
        }
    }
}

impl From<StartView> for ViewMode {
    fn from(view: StartView) -> Self {
        match view {
            StartView::Ground => ViewMode::Ground,
            StartView::Orbit => ViewMode::Orbit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewProfile {
    pub initial_distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub zoom_enabled: bool,
    pub grid: GridSpec,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Azimuth in radians.
    pub yaw: f32,
    /// Elevation in radians.
    pub pitch: f32,
    pub distance: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    mode: ViewMode,
    profile: ViewProfile,
    /// Radians per pixel of drag.
    pub sensitivity: f32,
    /// Fraction of the distance removed per wheel line.
    pub zoom_step: f32,
    /// Fraction of angular velocity kept per reference frame.
    pub damping: f32,
    /// Drag moves the view the way the pointer moves rather than the camera.
    pub reverse: bool,
    /// Radians per second while auto-rotating.
    pub auto_rotate_speed: f32,
}

impl OrbitControls {
    pub fn new(mode: ViewMode, config: &ViewerConfig) -> Self {
        let profile = mode.profile();
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: profile.initial_distance,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            mode,
            profile,
            sensitivity: config.orbit_sensitivity,
            zoom_step: config.zoom_sensitivity.clamp(0.0, 0.9),
            damping: config.damping.clamp(0.0, 0.999),
            reverse: true,
            auto_rotate_speed: config.auto_rotate_speed,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn profile(&self) -> &ViewProfile {
        &self.profile
    }

    /// Switch view mode. The distance resets to the mode's starting distance;
    /// the viewing direction is kept.
    pub fn set_mode(&mut self, mode: ViewMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.profile = mode.profile();
        self.distance = self.profile.initial_distance;
        tracing::info!(?mode, distance = self.distance, "View mode changed");
    }

    /// Apply a pointer drag in pixels.
    pub fn drag(&mut self, delta: Vec2) {
        let sign = if self.reverse { -1.0 } else { 1.0 };
        self.yaw_velocity += sign * delta.x * self.sensitivity;
        self.pitch_velocity += sign * delta.y * self.sensitivity;
    }

    /// Zoom by `lines` wheel steps. Returns false when zoom is disabled in the
    /// current mode.
    pub fn zoom(&mut self, lines: f32) -> bool {
        if !self.profile.zoom_enabled {
            return false;
        }
        let factor = (1.0 - self.zoom_step).powf(lines);
        self.distance = (self.distance * factor)
            .clamp(self.profile.min_distance, self.profile.max_distance);
        true
    }

    /// Advance inertia and auto-rotation by `dt` seconds.
    pub fn update(&mut self, dt: f32, auto_rotate: bool) {
        if auto_rotate {
            self.yaw += self.auto_rotate_speed * dt;
        }

        self.yaw += self.yaw_velocity;
        self.pitch = (self.pitch + self.pitch_velocity).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let keep = self.damping.powf(dt * DAMPING_REFERENCE_FPS);
        self.yaw_velocity *= keep;
        self.pitch_velocity *= keep;
        if self.yaw_velocity.abs() < SETTLED_VELOCITY {
            self.yaw_velocity = 0.0;
        }
        if self.pitch_velocity.abs() < SETTLED_VELOCITY {
            self.pitch_velocity = 0.0;
        }

        self.yaw = self.yaw.rem_euclid(std::f32::consts::TAU);
        self.distance = self
            .distance
            .clamp(self.profile.min_distance, self.profile.max_distance);
    }

    pub fn is_settled(&self) -> bool {
        self.yaw_velocity == 0.0 && self.pitch_velocity == 0.0
    }

    /// Camera position on the orbit sphere.
    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(
            self.distance * cos_pitch * sin_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * cos_yaw,
        )
    }

    /// Place `camera` on the orbit, looking at the planet.
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.eye();
        camera.look_at(Vec3::ZERO);
    }
}
