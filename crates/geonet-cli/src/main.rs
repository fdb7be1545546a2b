//! `geonet`: unfold the globe into two icosahedral hemisphere nets.
//!
//! Splits a pinned icosahedron into a west and an east half of ten faces
//! each, lays both flat, and rasterises them against elevation and
//! land-cover tiles into 8-bit height, land-cover and mask images.
//!
//! Run with: `cargo run -p geonet-cli -- --edge-px 2048`

mod error;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use geonet_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info};

use crate::error::PipelineError;

fn run(args: &CliArgs, config: &Config) -> Result<(), PipelineError> {
    config.validate()?;

    let plan = pipeline::plan(config)?;
    pipeline::log_net(&plan.west);
    pipeline::log_net(&plan.east);

    if args.dry_run {
        info!("Dry run: skipping tile fetches and rasterisation");
        return Ok(());
    }

    let outputs = pipeline::render(config, &plan)?;
    info!("Done: {} hemispheres written", outputs.len());
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    geonet_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    info!(
        "geonet {}: edge {} px, zoom {}, land-cover {} px/tile",
        env!("CARGO_PKG_VERSION"),
        config.net.edge_px,
        config.elevation.zoom,
        config.land_cover.tile_res
    );

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("geonet: {e}");
            ExitCode::FAILURE
        }
    }
}
