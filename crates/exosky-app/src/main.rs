//! The `exosky` binary.

use clap::Parser;
use exosky_app::platform::PlatformDirs;
use exosky_app::{StartRequest, run};
use exosky_config::{CliArgs, Config};
use std::process::ExitCode;

fn start_request(args: &CliArgs) -> StartRequest {
    match (&args.planet, &args.search) {
        (Some(planet), _) => StartRequest::Planet(planet.clone()),
        (None, Some(query)) => StartRequest::Search(query.clone()),
        (None, None) => StartRequest::Select,
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = match PlatformDirs::resolve(args.config.as_deref()) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to resolve platform directories: {e}");
            return ExitCode::FAILURE;
        }
    };
    let dirs_error = dirs.create_all().err();

    let (mut config, config_error) = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_cli_overrides(&args);

    exosky_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    if let Some(e) = dirs_error {
        tracing::warn!("Could not create app directories: {e}");
    }
    if let Some(e) = config_error {
        tracing::warn!("Using default config: {e}");
    }
    tracing::info!(
        config = %dirs.config_dir.display(),
        catalog = %config.catalog.base_url,
        "Exosky starting"
    );

    match run(config, dirs, start_request(&args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Event loop failed: {e}");
            ExitCode::FAILURE
        }
    }
}
