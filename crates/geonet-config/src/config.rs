//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level renderer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Net geometry in output pixels.
    pub net: NetConfig,
    /// Pinned icosahedron vertex.
    pub pin: PinConfig,
    /// Hemisphere split scoring and overrides.
    pub split: SplitConfig,
    /// Seam cut for the east hemisphere.
    pub seam: SeamConfig,
    /// Orientation fix-up for the west net.
    pub west_transform: TransformConfig,
    /// Orientation fix-up for the east net.
    pub east_transform: TransformConfig,
    /// Elevation tile source.
    pub elevation: ElevationConfig,
    /// Land-cover tile source.
    pub land_cover: LandCoverConfig,
    /// Network retry policy.
    pub fetch: FetchConfig,
    /// Output images.
    pub output: OutputConfig,
    /// Rasterisation threading.
    pub render: RenderConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeoRef {
    /// Latitude, north positive.
    pub lat: f64,
    /// Longitude, east positive.
    pub lon: f64,
}

/// Net geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetConfig {
    /// Triangle edge length in output pixels.
    pub edge_px: f64,
    /// Empty border around each net, pixels.
    pub margin_px: u32,
}

/// Rigid rotation that puts one vertex at a chosen location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PinConfig {
    /// Apply the pin at all.
    pub enabled: bool,
    /// Vertex id, 0..12.
    pub vertex_id: usize,
    /// Target latitude.
    pub lat: f64,
    /// Target longitude.
    pub lon: f64,
    /// Extra rotation about the pinned axis, degrees.
    pub twist_deg: f64,
}

/// Hemisphere split.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SplitConfig {
    /// Scoring anchor of the east hemisphere.
    pub east_ref: GeoRef,
    /// Scoring anchor of the west hemisphere.
    pub west_ref: GeoRef,
    /// Faces moved into the east hemisphere after the split.
    pub force_east: Vec<usize>,
    /// Faces moved into the west hemisphere after the split.
    pub force_west: Vec<usize>,
    /// Maximum connectivity repair rounds.
    pub repair_rounds: usize,
    /// Boundary faces tried per side in each repair round.
    pub repair_candidates: usize,
}

/// Seam cut.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeamConfig {
    /// Cut the east net at all.
    pub enabled: bool,
    /// Seam longitude.
    pub lon: f64,
    /// Edges at or south of this latitude are cut.
    pub start_lat: f64,
    /// Longitude tolerance, degrees.
    pub tolerance_deg: f64,
}

/// Mirror/rotate flags for one net.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransformConfig {
    /// Mirror horizontally.
    pub mirror_x: bool,
    /// Mirror vertically.
    pub mirror_y: bool,
    /// Rotate 90° counter-clockwise.
    pub rot90_left: bool,
}

/// Elevation tiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ElevationConfig {
    /// URL with `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,
    /// Web Mercator zoom; the globe is `2^zoom * tile_size` samples wide.
    pub zoom: u32,
    /// Tile edge in pixels.
    pub tile_size: usize,
    /// Directory for persisted tiles.
    pub cache_dir: PathBuf,
    /// Decoded tiles kept in memory.
    pub max_mem_tiles: usize,
}

/// Land-cover tiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LandCoverConfig {
    /// URL with a `{tile}` placeholder, e.g. `N24E021`.
    pub url_template: String,
    /// Samples per tile edge after resampling.
    pub tile_res: usize,
    /// Directory for persisted tiles.
    pub cache_dir: PathBuf,
    /// Decoded tiles kept in memory.
    pub max_mem_tiles: usize,
}

/// Network retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts per URL.
    pub attempts: u32,
    /// Delay before retry `i` is `backoff_base^i` seconds.
    pub backoff_base: f64,
    /// Per-request timeout, seconds.
    pub timeout_secs: u64,
}

/// Output images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the images are written to.
    pub dir: PathBuf,
    /// File name prefix of the west hemisphere.
    pub west_prefix: String,
    /// File name prefix of the east hemisphere.
    pub east_prefix: String,
    /// Elevation mapped to 0 in the 8-bit image.
    pub elevation_lo_m: f64,
    /// Elevation mapped to 255 in the 8-bit image.
    pub elevation_hi_m: f64,
    /// Force elevations at or below sea level to 0.
    pub sea_level_black: bool,
}

/// Rasterisation threading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Worker threads per hemisphere; 0 picks from the CPU count.
    pub threads: usize,
    /// Render both hemispheres at once.
    pub parallel_hemispheres: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            net: NetConfig::default(),
            pin: PinConfig::default(),
            split: SplitConfig::default(),
            seam: SeamConfig::default(),
            west_transform: TransformConfig::west_default(),
            east_transform: TransformConfig::east_default(),
            elevation: ElevationConfig::default(),
            land_cover: LandCoverConfig::default(),
            fetch: FetchConfig::default(),
            output: OutputConfig::default(),
            render: RenderConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            edge_px: 8000.0,
            margin_px: 32,
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vertex_id: 0,
            lat: 26.0,
            lon: 25.0,
            twist_deg: 0.0,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            east_ref: GeoRef { lat: 25.0, lon: 20.0 },
            west_ref: GeoRef { lat: 15.0, lon: -90.0 },
            force_east: Vec::new(),
            force_west: Vec::new(),
            repair_rounds: 200,
            repair_candidates: 8,
        }
    }
}

impl Default for SeamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lon: 25.0,
            start_lat: 26.0,
            tolerance_deg: 12.0,
        }
    }
}

impl TransformConfig {
    /// Default west orientation: quarter turn left.
    #[must_use]
    pub fn west_default() -> Self {
        Self {
            rot90_left: true,
            ..Self::default()
        }
    }

    /// Default east orientation: horizontal mirror.
    #[must_use]
    pub fn east_default() -> Self {
        Self {
            mirror_x: true,
            ..Self::default()
        }
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            url_template: "https://s3.amazonaws.com/elevation-tiles-prod/terrarium/{z}/{x}/{y}.png".to_string(),
            zoom: 7,
            tile_size: 256,
            cache_dir: PathBuf::from("data_cache/terrarium_tiles"),
            max_mem_tiles: 512,
        }
    }
}

impl Default for LandCoverConfig {
    fn default() -> Self {
        Self {
            url_template:
                "https://esa-worldcover.s3.eu-central-1.amazonaws.com/v100/2020/map/ESA_WorldCover_10m_2020_v100_{tile}_Map.tif"
                    .to_string(),
            tile_res: 512,
            cache_dir: PathBuf::from("data_cache/worldcover_tiles"),
            max_mem_tiles: 64,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            attempts: 6,
            backoff_base: 1.5,
            timeout_secs: 180,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            west_prefix: "americas".to_string(),
            east_prefix: "eurafrasia".to_string(),
            elevation_lo_m: -10.0,
            elevation_hi_m: 8000.0,
            sea_level_black: true,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            parallel_hemispheres: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for this tool, e.g. `~/.config/geonet`.
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("geonet"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read the file: returns `Some(new_config)` if it changed, `None`
    /// otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if !(self.net.edge_px.is_finite() && self.net.edge_px > 0.0) {
            return invalid("net.edge_px", "must be a positive number");
        }
        if self.pin.vertex_id >= 12 {
            return invalid("pin.vertex_id", "must be below 12");
        }
        if !(0.0..=180.0).contains(&self.seam.tolerance_deg) {
            return invalid("seam.tolerance_deg", "must be within 0..=180");
        }
        if self.elevation.zoom > 24 {
            return invalid("elevation.zoom", "must be at most 24");
        }
        if self.elevation.tile_size < 2 {
            return invalid("elevation.tile_size", "must be at least 2");
        }
        if self.land_cover.tile_res < 2 {
            return invalid("land_cover.tile_res", "must be at least 2");
        }
        if !(self.fetch.backoff_base.is_finite() && self.fetch.backoff_base >= 0.0) {
            return invalid("fetch.backoff_base", "must be a non-negative number");
        }
        if self.fetch.timeout_secs == 0 {
            return invalid("fetch.timeout_secs", "must be at least 1");
        }
        if self.output.elevation_hi_m <= self.output.elevation_lo_m {
            return invalid("output.elevation_hi_m", "must exceed output.elevation_lo_m");
        }
        if let Some(&f) = self.split.force_east.iter().chain(&self.split.force_west).find(|&&f| f >= 20) {
            return invalid("split.force_*", &format!("face id {f} is not below 20"));
        }
        Ok(())
    }
}
