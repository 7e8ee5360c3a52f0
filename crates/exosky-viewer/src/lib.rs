//! The interactive star view around a selected exoplanet.
//!
//! [`ViewerState`] holds everything that does not touch the GPU and is where
//! input turns into camera motion, rotation changes and chart exports.
//! [`Scene`] adds the star and grid renderers on top.

pub mod controls;
pub mod export;
pub mod rotation;
pub mod scene;
pub mod state;
pub mod tracker;

pub use controls::{OrbitControls, ViewMode, ViewProfile};
pub use export::{ChartExporter, ChartSource, ExportError, ExportStart, save_chart};
pub use rotation::{
    ResumeTimers, RotationController, RotationEvent, RotationState, Step, TimerCommand,
    TimerHandle, transition,
};
pub use scene::Scene;
pub use state::{ViewerEvent, ViewerState};
pub use tracker::{CameraSnapshot, CameraTracker, CameraVectors};
