//! PNG outputs for a rendered hemisphere.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};
use tracing::info;

use crate::canvas::Canvas;
use crate::error::RasterError;
use crate::palette::class_color;

/// Linear mapping of elevations onto `0..=255`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElevationRange {
    /// Elevation mapped to 0, metres.
    pub lo: f64,
    /// Elevation mapped to 255, metres.
    pub hi: f64,
    /// Write 0 for every elevation at or below sea level.
    pub sea_black: bool,
}

impl Default for ElevationRange {
    fn default() -> Self {
        Self {
            lo: -10.0,
            hi: 8000.0,
            sea_black: true,
        }
    }
}

/// 8-bit grey level of one elevation. `NaN` maps to 0.
#[must_use]
pub fn elevation_to_u8(h: f32, range: ElevationRange) -> u8 {
    if h.is_nan() {
        return 0;
    }
    let h = f64::from(h);
    if range.sea_black && h <= 0.0 {
        return 0;
    }
    let t = (h.clamp(range.lo, range.hi) - range.lo) * 255.0 / (range.hi - range.lo);
    t.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Greyscale elevation image; uncovered pixels are black.
#[must_use]
pub fn elevation_image(canvas: &Canvas, range: ElevationRange) -> GrayImage {
    GrayImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        if canvas.is_covered(x, y) {
            Luma([elevation_to_u8(canvas.elevation(x, y), range)])
        } else {
            Luma([0])
        }
    })
}

/// Land-cover classes painted with the WorldCover palette.
#[must_use]
pub fn landcover_rgb(canvas: &Canvas) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        if canvas.is_covered(x, y) {
            Rgb(class_color(canvas.class(x, y)))
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// 255 where a face covers the pixel, else 0.
#[must_use]
pub fn mask_image(canvas: &Canvas) -> GrayImage {
    GrayImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        Luma([if canvas.is_covered(x, y) { 255 } else { 0 }])
    })
}

/// Files written by [`write_outputs`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    /// `{prefix}_height_0_8000_8bit.png`
    pub elevation: PathBuf,
    /// `{prefix}_landcover.png`
    pub land_cover: PathBuf,
    /// `{prefix}_mask.png`
    pub mask: PathBuf,
}

impl OutputPaths {
    /// Paths for `prefix` inside `dir`.
    #[must_use]
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            elevation: dir.join(format!("{prefix}_height_0_8000_8bit.png")),
            land_cover: dir.join(format!("{prefix}_landcover.png")),
            mask: dir.join(format!("{prefix}_mask.png")),
        }
    }
}

/// Write the elevation, land-cover and mask PNGs for one hemisphere.
pub fn write_outputs(
    canvas: &Canvas,
    dir: &Path,
    prefix: &str,
    range: ElevationRange,
) -> Result<OutputPaths, RasterError> {
    std::fs::create_dir_all(dir)?;
    let paths = OutputPaths::new(dir, prefix);

    elevation_image(canvas, range).save(&paths.elevation)?;
    landcover_rgb(canvas).save(&paths.land_cover)?;
    mask_image(canvas).save(&paths.mask)?;

    info!(
        "Wrote {}x{} {} images to {}",
        canvas.width(),
        canvas.height(),
        prefix,
        dir.display()
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasLayout;
    use glam::DVec2;

    fn canvas() -> Canvas {
        Canvas::new(CanvasLayout {
            width: 4,
            height: 3,
            min: DVec2::ZERO,
            margin: 0,
        })
    }

    #[test]
    fn test_elevation_mapping() {
        let range = ElevationRange::default();
        assert_eq!(elevation_to_u8(f32::NAN, range), 0);
        assert_eq!(elevation_to_u8(-500.0, range), 0);
        assert_eq!(elevation_to_u8(0.0, range), 0);
        assert_eq!(elevation_to_u8(100.0, range), 4);
        assert_eq!(elevation_to_u8(4000.0, range), 128);
        assert_eq!(elevation_to_u8(8000.0, range), 255);
        assert_eq!(elevation_to_u8(9000.0, range), 255);
    }

    #[test]
    fn test_elevation_mapping_keeps_shallow_sea() {
        let range = ElevationRange {
            sea_black: false,
            ..ElevationRange::default()
        };
        assert_eq!(elevation_to_u8(-10.0, range), 0);
        assert_eq!(elevation_to_u8(-500.0, range), 0);
        let custom = ElevationRange {
            lo: -100.0,
            hi: 155.0,
            sea_black: false,
        };
        assert_eq!(elevation_to_u8(-50.0, custom), 50);
    }

    #[test]
    fn test_images_follow_coverage() {
        let mut c = canvas();
        c.put(0, 1, 1, 8000.0, 10);
        c.put(0, 2, 1, f32::NAN, 42);

        let mask = mask_image(&c);
        assert_eq!(mask.get_pixel(1, 1).0, [255]);
        assert_eq!(mask.get_pixel(2, 1).0, [255]);
        assert_eq!(mask.get_pixel(0, 0).0, [0]);

        let elev = elevation_image(&c, ElevationRange::default());
        assert_eq!(elev.get_pixel(1, 1).0, [255]);
        assert_eq!(elev.get_pixel(2, 1).0, [0]);

        let land = landcover_rgb(&c);
        assert_eq!(land.get_pixel(1, 1).0, [0, 100, 0]);
        assert_eq!(land.get_pixel(2, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut c = canvas();
        c.put(3, 0, 0, 1000.0, 80);

        let paths = write_outputs(&c, &out, "americas", ElevationRange::default()).unwrap();
        assert_eq!(paths.elevation, out.join("americas_height_0_8000_8bit.png"));
        assert_eq!(paths.land_cover, out.join("americas_landcover.png"));
        assert_eq!(paths.mask, out.join("americas_mask.png"));

        let land = image::open(&paths.land_cover).unwrap().to_rgb8();
        assert_eq!(land.dimensions(), (4, 3));
        assert_eq!(land.get_pixel(0, 0).0, [0, 100, 200]);
        let mask = image::open(&paths.mask).unwrap().to_luma8();
        assert_eq!(mask.get_pixel(0, 0).0, [255]);
        assert_eq!(mask.get_pixel(3, 2).0, [0]);
    }
}
