//! Terrarium-encoded elevation tiles on a Web Mercator grid.

use std::f64::consts::{FRAC_PI_4, PI};
use std::fmt;
use std::path::PathBuf;

use geonet_coords::{LatLon, wrap_lon};

use crate::cache::TileCache;
use crate::error::TileError;
use crate::fetch::Fetcher;
use crate::sampler::{GeoSampler, group_by_tile};
use crate::source::{Fetched, TileSource};
use crate::tile::Tile;

/// Highest latitude representable in Web Mercator.
pub const MAX_MERCATOR_LAT: f64 = 85.05112878;

/// A Web Mercator tile address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TerrariumKey {
    /// Zoom level.
    pub z: u32,
    /// Column, west to east.
    pub x: u32,
    /// Row, north to south.
    pub y: u32,
}

impl fmt::Display for TerrariumKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Tile containing `p` at `zoom`, plus the fractional in-tile row and column
/// scaled to `tile_size - 1`.
#[must_use]
pub fn mercator_locate(p: LatLon, zoom: u32, tile_size: usize) -> (TerrariumKey, f64, f64) {
    let n = f64::from(1u32 << zoom);
    let lat = p.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let u = (wrap_lon(p.lon) + 180.0) / 360.0;
    let v = (1.0 - (FRAC_PI_4 + lat / 2.0).tan().ln() / PI) / 2.0;

    let xf = u * n;
    let yf = v * n;
    let tx = xf.floor().clamp(0.0, n - 1.0);
    let ty = yf.floor().clamp(0.0, n - 1.0);
    let span = tile_size as f64 - 1.0;

    let key = TerrariumKey {
        z: zoom,
        x: tx as u32,
        y: ty as u32,
    };
    (key, (yf - ty) * span, (xf - tx) * span)
}

/// Decode a Terrarium PNG: `R*256 + G + B/256 - 32768` metres, with fully
/// transparent pixels as `NaN`.
pub fn decode_terrarium(bytes: &[u8]) -> Result<Tile<f32>, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (w, h) = rgba.dimensions();
    let samples = rgba
        .pixels()
        .map(|px| {
            let [r, g, b, a] = px.0;
            if a == 0 {
                f32::NAN
            } else {
                f32::from(r) * 256.0 + f32::from(g) + f32::from(b) / 256.0 - 32768.0
            }
        })
        .collect();
    Ok(Tile::from_vec(h as usize, w as usize, samples).unwrap_or_else(|| Tile::zeros(0, 0)))
}

/// Elevation source fetching Terrarium tiles from a `{z}/{x}/{y}` URL
/// template.
pub struct TerrariumSource<F> {
    fetcher: F,
    url_template: String,
    zoom: u32,
    tile_size: usize,
}

impl<F: Fetcher> TerrariumSource<F> {
    /// Source at a fixed zoom level.
    pub fn new(fetcher: F, url_template: impl Into<String>, zoom: u32, tile_size: usize) -> Self {
        Self {
            fetcher,
            url_template: url_template.into(),
            zoom,
            tile_size,
        }
    }

    /// URL of one tile.
    #[must_use]
    pub fn url(&self, key: &TerrariumKey) -> String {
        self.url_template
            .replace("{z}", &key.z.to_string())
            .replace("{x}", &key.x.to_string())
            .replace("{y}", &key.y.to_string())
    }

    /// See [`mercator_locate`].
    #[must_use]
    pub fn locate(&self, p: LatLon) -> (TerrariumKey, f64, f64) {
        mercator_locate(p, self.zoom, self.tile_size)
    }
}

impl<F: Fetcher> TileSource for TerrariumSource<F> {
    type Key = TerrariumKey;
    type Sample = f32;

    fn name(&self) -> &'static str {
        "terrarium"
    }

    fn tile_shape(&self) -> (usize, usize) {
        (self.tile_size, self.tile_size)
    }

    fn file_name(&self, key: &TerrariumKey) -> PathBuf {
        PathBuf::from(format!("z{}", key.z)).join(format!("x{}_y{}_f32.tile", key.x, key.y))
    }

    fn fetch(&self, key: &TerrariumKey) -> Result<Fetched<f32>, TileError> {
        let bytes = self.fetcher.fetch(&self.url(key))?;
        let tile = decode_terrarium(&bytes).map_err(|e| TileError::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        if tile.shape() != self.tile_shape() {
            return Err(TileError::Decode {
                key: key.to_string(),
                reason: format!("tile is {:?}, expected {:?}", tile.shape(), self.tile_shape()),
            });
        }
        Ok(Fetched::Fresh(tile))
    }
}

impl<F: Fetcher> GeoSampler for TileCache<TerrariumSource<F>> {
    type Output = f32;

    /// Bilinear elevation in metres; `NaN` where the source has no data.
    fn sample(&self, points: &[LatLon]) -> Result<Vec<f32>, TileError> {
        let located: Vec<_> = points.iter().map(|&p| self.source().locate(p)).collect();
        let mut out = vec![0.0; points.len()];
        for (key, idx) in group_by_tile(located.iter().map(|l| l.0)) {
            let tile = self.get(&key)?;
            for i in idx {
                let (_, row, col) = located[i];
                out[i] = tile.bilinear(row, col);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::store::TileStore;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    const EPSILON: f64 = 1e-9;

    fn png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    /// Serves fixed bodies by URL and records every request.
    struct MapFetcher {
        bodies: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<String>>,
    }

    impl Fetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::NotFound { url: url.to_string() })
        }
    }

    #[test]
    fn test_decode_terrarium_values() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([128, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([129, 2, 128, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 0, 0]));
        let tile = decode_terrarium(&png(&img)).unwrap();
        assert_eq!(tile.shape(), (2, 2));
        assert_eq!(tile.get(0, 0), 0.0);
        assert_eq!(tile.get(0, 1), 258.5);
        assert!(tile.get(1, 0).is_nan());
    }

    #[test]
    fn test_locate_origin() {
        let (key, row, col) = mercator_locate(LatLon::new(0.0, 0.0), 1, 256);
        assert_eq!(key, TerrariumKey { z: 1, x: 1, y: 1 });
        assert!(row.abs() < 1e-6 && col.abs() < EPSILON);
    }

    #[test]
    fn test_locate_clamps_and_wraps() {
        let (key, _, col) = mercator_locate(LatLon::new(89.9, 180.0), 3, 256);
        assert_eq!((key.x, key.y), (0, 0));
        assert!(col.abs() < EPSILON);

        let (key, row, _) = mercator_locate(LatLon::new(-90.0, 179.999), 3, 256);
        assert_eq!((key.x, key.y), (7, 7));
        assert!(row > 254.0 && row <= 255.0 + 1e-6);
    }

    #[test]
    fn test_file_name_and_url() {
        let src = TerrariumSource::new(
            MapFetcher {
                bodies: HashMap::new(),
                requests: Mutex::new(Vec::new()),
            },
            "https://h/{z}/{x}/{y}.png",
            7,
            256,
        );
        let key = TerrariumKey { z: 7, x: 12, y: 40 };
        assert_eq!(src.url(&key), "https://h/7/12/40.png");
        assert_eq!(src.file_name(&key), PathBuf::from("z7").join("x12_y40_f32.tile"));
    }

    #[test]
    fn test_sampler_groups_and_persists() {
        // zoom 0: the whole globe is one tile.
        let img = RgbaImage::from_pixel(4, 4, Rgba([128, 100, 0, 255]));
        let fetcher = MapFetcher {
            bodies: HashMap::from([("t/0/0/0".to_string(), png(&img))]),
            requests: Mutex::new(Vec::new()),
        };
        let dir = tempfile::tempdir().unwrap();
        let cache = TileCache::new(
            TerrariumSource::new(fetcher, "t/{z}/{x}/{y}", 0, 4),
            TileStore::new(dir.path()),
            4,
        );

        let pts = [LatLon::new(10.0, 20.0), LatLon::new(-45.0, -170.0), LatLon::new(60.0, 90.0)];
        let h = cache.sample(&pts).unwrap();
        assert_eq!(h, vec![100.0; 3]);
        assert_eq!(cache.source().fetcher.requests.lock().unwrap().len(), 1);
        assert!(dir.path().join("z0").join("x0_y0_f32.tile").exists());
    }

    #[test]
    fn test_missing_elevation_tile_is_fatal() {
        let fetcher = MapFetcher {
            bodies: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        };
        let dir = tempfile::tempdir().unwrap();
        let cache = TileCache::new(
            TerrariumSource::new(fetcher, "t/{z}/{x}/{y}", 2, 4),
            TileStore::new(dir.path()),
            4,
        );
        let err = cache.sample(&[LatLon::new(0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, TileError::Fetch(FetchError::NotFound { .. })));
    }

    #[test]
    fn test_wrong_tile_size_rejected() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([128, 0, 0, 255]));
        let fetcher = MapFetcher {
            bodies: HashMap::from([("0/0/0".to_string(), png(&img))]),
            requests: Mutex::new(Vec::new()),
        };
        let src = TerrariumSource::new(fetcher, "{z}/{x}/{y}", 0, 256);
        assert!(matches!(
            src.fetch(&TerrariumKey { z: 0, x: 0, y: 0 }),
            Err(TileError::Decode { .. })
        ));
    }
}
