//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Star rendering settings.
    pub render: RenderConfig,
    /// Catalog service settings.
    pub catalog: CatalogConfig,
    /// Camera and rotation behavior.
    pub viewer: ViewerConfig,
    /// Chart export settings.
    pub export: ExportConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Star field rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Background clear color (linear RGB).
    pub background: [f32; 3],
    /// Fog color blended into distant stars.
    pub fog_color: [f32; 3],
    /// Distance at which fog starts.
    pub fog_near: f32,
    /// Distance at which fog fully hides a star.
    pub fog_far: f32,
    /// Global multiplier applied to every star size.
    pub star_size: f32,
    /// Screen-space scale from star size to sprite pixels.
    pub point_scale: f32,
    /// Smallest sprite drawn, in pixels.
    pub min_point_px: f32,
    /// Largest sprite drawn, in pixels.
    pub max_point_px: f32,
    /// Show the ground reference grid on startup.
    pub show_grid: bool,
}

/// Catalog service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the catalog service (no trailing slash needed).
    pub base_url: String,
    /// Maximum stars requested per planet.
    pub star_limit: u32,
    /// Half height of the query volume around the planet, in parsecs.
    pub trunk_halfheight: f32,
    /// Maximum planets returned by a search.
    pub search_count: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

/// Initial camera placement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum StartView {
    /// Camera sits on the planet, zoom disabled.
    Ground,
    /// Camera orbits the planet from a distance, zoom enabled.
    Orbit,
}

/// Camera controls and rotation behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Where the camera starts.
    pub start_view: StartView,
    /// Start with auto-rotation enabled.
    pub auto_rotate: bool,
    /// Auto-rotation speed in radians per second.
    pub auto_rotate_speed: f32,
    /// Idle time after an interaction before auto-rotation resumes.
    pub resume_delay_ms: u64,
    /// Mouse drag sensitivity in radians per pixel.
    pub orbit_sensitivity: f32,
    /// Scroll zoom step as a fraction of the current distance.
    pub zoom_sensitivity: f32,
    /// Fraction of angular velocity kept each frame (0 = no inertia).
    pub damping: f32,
}

/// Chart export configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Chart size passed to the export endpoint.
    pub chart_size: u32,
    /// Directory exported charts are written to. `None` uses the OS download dir.
    pub output_dir: Option<PathBuf>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log frame statistics periodically.
    pub show_fps: bool,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Exosky".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: [0.0, 0.0, 0.0],
            fog_color: [0.0, 0.0, 0.0],
            fog_near: 20_000.0,
            fog_far: 600_000.0,
            star_size: 1.0,
            point_scale: 1000.0,
            min_point_px: 1.5,
            max_point_px: 48.0,
            show_grid: true,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            star_limit: 10_000,
            trunk_halfheight: 50.0,
            search_count: 10,
            timeout_seconds: 120,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            start_view: StartView::Ground,
            auto_rotate: true,
            auto_rotate_speed: 0.05,
            resume_delay_ms: 4000,
            orbit_sensitivity: 0.004,
            zoom_sensitivity: 0.1,
            damping: 0.9,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chart_size: 80,
            output_dir: None,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_fps: false,
            log_level: "info".to_string(),
        }
    }
}

const CONFIG_FILE: &str = "config.ron";

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Read `config.ron` from `config_dir`. A missing file is replaced by the
    /// defaults, which are written back so the user has something to edit.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            let config = Self::default();
            config.save(config_dir)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }
        let config = read_config(&path)?;
        log::info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Write `config.ron` into `config_dir`, creating the directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        let write_err = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_err)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(&path, text).map_err(write_err)
    }

    /// Resume delay as a [`std::time::Duration`].
    pub fn resume_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.viewer.resume_delay_ms)
    }
}
