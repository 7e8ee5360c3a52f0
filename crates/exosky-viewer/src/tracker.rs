//! Last-frame camera orientation, written by the render loop and read on
//! demand by chart export.

use exosky_render::Camera;
use glam::{Quat, Vec3};
use std::cell::Cell;
use std::rc::Rc;

/// World orientation and position of the camera in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraVectors {
    pub orientation: Quat,
    pub position: Vec3,
}

impl CameraVectors {
    /// Distance from the planet at the origin.
    pub fn distance(&self) -> f32 {
        self.position.length()
    }

    /// Orientation as `[x, y, z, w]`.
    pub fn quaternion(&self) -> [f32; 4] {
        self.orientation.to_array()
    }
}

/// Writer side. Only the render loop records.
#[derive(Debug, Default)]
pub struct CameraTracker {
    latest: Rc<Cell<Option<CameraVectors>>>,
}

impl CameraTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `camera` as the latest snapshot, replacing the previous one.
    pub fn record(&self, camera: &Camera) {
        self.latest.set(Some(CameraVectors {
            orientation: camera.rotation,
            position: camera.position,
        }));
    }

    pub fn reader(&self) -> CameraSnapshot {
        CameraSnapshot {
            latest: Rc::clone(&self.latest),
        }
    }
}

/// Read-only handle onto a [`CameraTracker`].
#[derive(Debug, Clone)]
pub struct CameraSnapshot {
    latest: Rc<Cell<Option<CameraVectors>>>,
}

impl CameraSnapshot {
    /// The most recently recorded vectors, `None` before the first frame.
    pub fn latest(&self) -> Option<CameraVectors> {
        self.latest.get()
    }
}
