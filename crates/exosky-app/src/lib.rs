//! Exosky application shell.
//!
//! Window creation, the planet selection and loading screens, background
//! catalog requests and user notifications.

pub mod fetch;
pub mod notify;
pub mod platform;
pub mod screen;
pub mod window;

pub use window::{App, StartRequest, run, window_attributes_from_config};
