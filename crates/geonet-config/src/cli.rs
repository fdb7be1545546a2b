//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Command-line arguments for the `geonet` binary.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "geonet", about = "Unfold the globe into two icosahedral hemisphere nets")]
pub struct CliArgs {
    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Triangle edge length in output pixels.
    #[arg(long)]
    pub edge_px: Option<f64>,

    /// Elevation tile zoom level.
    #[arg(long)]
    pub zoom: Option<u32>,

    /// Land-cover samples per tile edge.
    #[arg(long)]
    pub tile_res: Option<usize>,

    /// Seam longitude tolerance in degrees.
    #[arg(long)]
    pub seam_tolerance: Option<f64>,

    /// Do not cut a seam into the east net.
    #[arg(long)]
    pub no_seam: bool,

    /// Directory for the output images.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Rasteriser worker threads per hemisphere (0 = auto).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Stop after unfolding; no tiles are fetched and no images written.
    #[arg(long)]
    pub dry_run: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(px) = args.edge_px {
            self.net.edge_px = px;
        }
        if let Some(z) = args.zoom {
            self.elevation.zoom = z;
        }
        if let Some(res) = args.tile_res {
            self.land_cover.tile_res = res;
        }
        if let Some(tol) = args.seam_tolerance {
            self.seam.tolerance_deg = tol;
        }
        if args.no_seam {
            self.seam.enabled = false;
        }
        if let Some(ref dir) = args.out_dir {
            self.output.dir = dir.clone();
        }
        if let Some(t) = args.threads {
            self.render.threads = t;
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
            edge_px: Some(2048.0),
            seam_tolerance: Some(6.0),
            no_seam: true,
            out_dir: Some(PathBuf::from("out")),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.net.edge_px, 2048.0);
        assert_eq!(config.seam.tolerance_deg, 6.0);
        assert!(!config.seam.enabled);
        assert_eq!(config.output.dir, PathBuf::from("out"));
        // Non-overridden fields retain defaults
        assert_eq!(config.elevation.zoom, 7);
        assert_eq!(config.land_cover.tile_res, 512);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "geonet",
            "--zoom",
            "5",
            "--tile-res",
            "128",
            "--dry-run",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.zoom, Some(5));
        assert_eq!(args.tile_res, Some(128));
        assert!(args.dry_run);
        assert!(!args.no_seam);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }
}
