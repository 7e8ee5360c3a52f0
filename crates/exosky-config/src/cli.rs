//! Command-line argument parsing for the Exosky viewer.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, StartView};

/// Exosky command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "exosky", about = "Star field viewer around exoplanets")]
pub struct CliArgs {
    /// Planet to open directly (e.g. "Kepler-22 b"). Without it the first
    /// search result for `--search` is used.
    pub planet: Option<String>,

    /// Search query used to pick a planet when none is given.
    #[arg(long)]
    pub search: Option<String>,

    /// Catalog service base URL.
    #[arg(long)]
    pub catalog_url: Option<String>,

    /// Maximum stars requested for the planet.
    #[arg(long)]
    pub star_limit: Option<u32>,

    /// Idle delay in milliseconds before auto-rotation resumes.
    #[arg(long)]
    pub resume_delay_ms: Option<u64>,

    /// Starting camera placement.
    #[arg(long, value_enum)]
    pub view: Option<StartView>,

    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref url) = args.catalog_url {
            self.catalog.base_url = url.clone();
        }
        if let Some(limit) = args.star_limit {
            self.catalog.star_limit = limit;
        }
        if let Some(delay) = args.resume_delay_ms {
            self.viewer.resume_delay_ms = delay;
        }
        if let Some(view) = args.view {
            self.viewer.start_view = view;
        }
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            catalog_url: Some("http://192.168.1.1:8000".to_string()),
            view: Some(StartView::Orbit),
            resume_delay_ms: Some(3000),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.catalog.base_url, "http://192.168.1.1:8000");
        assert_eq!(config.viewer.start_view, StartView::Orbit);
        assert_eq!(config.viewer.resume_delay_ms, 3000);
        // Non-overridden fields retain defaults
        assert_eq!(config.catalog.star_limit, 10_000);
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_parse_positional_planet_and_flags() {
        let args = CliArgs::parse_from([
            "exosky",
            "Kepler-22 b",
            "--view",
            "orbit",
            "--star-limit",
            "500",
        ]);
        assert_eq!(args.planet.as_deref(), Some("Kepler-22 b"));
        assert_eq!(args.view, Some(StartView::Orbit));
        assert_eq!(args.star_limit, Some(500));
    }
}
