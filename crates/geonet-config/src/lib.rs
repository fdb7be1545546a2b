//! Configuration for the hemisphere net renderer.
//!
//! Settings persist to disk as `config.ron`, missing sections fall back to
//! defaults, and individual fields can be overridden from the command line.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, ElevationConfig, FetchConfig, GeoRef, LandCoverConfig, NetConfig, OutputConfig,
    PinConfig, RenderConfig, SeamConfig, SplitConfig, TransformConfig, default_config_dir,
};
pub use error::ConfigError;
