//! 3° land-cover class tiles from single-band GeoTIFFs.

use std::collections::hash_map::Entry;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;

use geonet_coords::{LatLon, wrap_lon};
use rustc_hash::FxHashMap;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::warn;

use crate::cache::TileCache;
use crate::error::{FetchError, TileError};
use crate::fetch::Fetcher;
use crate::sampler::{GeoSampler, group_by_tile};
use crate::source::{Fetched, TileSource};
use crate::tile::Tile;

/// Cell edge in degrees.
pub const CELL_DEG: i32 = 3;

const EDGE_EPS: f64 = 1e-9;

/// A 3° × 3° cell named by its south-west corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellId {
    /// Southern edge latitude, a multiple of 3 in `-90..=87`.
    pub lat0: i32,
    /// Western edge longitude, a multiple of 3 in `-180..=177`.
    pub lon0: i32,
}

impl CellId {
    /// The cell containing `p`. Latitudes are pulled just inside the poles
    /// and longitudes wrapped into `[-180, 180)`.
    #[must_use]
    pub fn containing(p: LatLon) -> Self {
        let (lat, lon) = clamp_point(p);
        let step = f64::from(CELL_DEG);
        let lat0 = ((lat / step).floor() * step).clamp(-90.0, 87.0);
        let lon0 = ((lon / step).floor() * step).clamp(-180.0, 177.0);
        Self {
            lat0: lat0 as i32,
            lon0: lon0 as i32,
        }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat0 >= 0 { 'N' } else { 'S' };
        let ew = if self.lon0 >= 0 { 'E' } else { 'W' };
        write!(f, "{ns}{:02}{ew}{:03}", self.lat0.abs(), self.lon0.abs())
    }
}

fn clamp_point(p: LatLon) -> (f64, f64) {
    let lat = p.lat.clamp(-90.0 + EDGE_EPS, 90.0 - EDGE_EPS);
    let lon = wrap_lon(p.lon).clamp(-180.0 + EDGE_EPS, 180.0 - EDGE_EPS);
    (lat, lon)
}

/// Failure to turn GeoTIFF bytes into a class tile.
#[derive(Debug, thiserror::Error)]
pub enum GeoTiffError {
    /// The TIFF decoder rejected the data.
    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),
    /// Samples are not 8-bit unsigned.
    #[error("expected 8-bit class samples")]
    SampleFormat,
}

/// Nearest-neighbour resample of a single-band 8-bit GeoTIFF to
/// `res × res`.
///
/// Output pixel `i` reads source pixel `floor((i + 0.5) * src / res)`. Only
/// the chunks that contribute a sample are decoded, one band of chunk rows
/// at a time.
pub fn resample_geotiff(bytes: &[u8], res: usize) -> Result<Tile<u8>, GeoTiffError> {
    let mut decoder = Decoder::new(Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions()?;
    let (chunk_w, chunk_h) = decoder.chunk_dimensions();
    let chunks_across = width.div_ceil(chunk_w);

    let pick = |i: usize, src: u32| -> u32 {
        let s = ((i as f64 + 0.5) * f64::from(src) / res as f64) as u32;
        s.min(src.saturating_sub(1))
    };
    let src_cols: Vec<u32> = (0..res).map(|j| pick(j, width)).collect();

    let mut out = vec![0u8; res * res];
    let mut band: FxHashMap<u32, (Vec<u8>, u32)> = FxHashMap::default();
    let mut band_row = u32::MAX;

    for i in 0..res {
        let sr = pick(i, height);
        let chunk_row = sr / chunk_h;
        if chunk_row != band_row {
            band.clear();
            band_row = chunk_row;
        }
        for (j, &sc) in src_cols.iter().enumerate() {
            let idx = chunk_row * chunks_across + sc / chunk_w;
            let (data, stride) = match band.entry(idx) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let data = match decoder.read_chunk(idx)? {
                        DecodingResult::U8(v) => v,
                        _ => return Err(GeoTiffError::SampleFormat),
                    };
                    let (stride, _) = decoder.chunk_data_dimensions(idx);
                    e.insert((data, stride))
                }
            };
            let local = (sr % chunk_h) as usize * *stride as usize + (sc % chunk_w) as usize;
            out[i * res + j] = data.get(local).copied().unwrap_or(0);
        }
    }

    Ok(Tile::from_vec(res, res, out).unwrap_or_else(|| Tile::zeros(res, res)))
}

/// Land-cover source fetching one GeoTIFF per [`CellId`] from a `{tile}`
/// URL template.
///
/// Any failure to obtain a tile degrades to an all-zero (no data) tile with
/// a warning. Only a tile the server reports as absent is written to disk
/// that way; other failures are retried on the next run.
pub struct WorldCoverSource<F> {
    fetcher: F,
    url_template: String,
    tile_res: usize,
}

impl<F: Fetcher> WorldCoverSource<F> {
    /// Source resampling every cell to `tile_res × tile_res`.
    pub fn new(fetcher: F, url_template: impl Into<String>, tile_res: usize) -> Self {
        Self {
            fetcher,
            url_template: url_template.into(),
            tile_res,
        }
    }

    /// URL of one cell.
    #[must_use]
    pub fn url(&self, key: &CellId) -> String {
        self.url_template.replace("{tile}", &key.to_string())
    }

    /// Cell containing `p` and the fractional in-tile row and column.
    #[must_use]
    pub fn locate(&self, p: LatLon) -> (CellId, f64, f64) {
        let cell = CellId::containing(p);
        let (lat, lon) = clamp_point(p);
        let span = self.tile_res as f64 - 1.0;
        let step = f64::from(CELL_DEG);
        let row = (f64::from(cell.lat0 + CELL_DEG) - lat) / step * span;
        let col = (lon - f64::from(cell.lon0)) / step * span;
        (cell, row, col)
    }

    fn substitute(&self, persist: bool) -> Fetched<u8> {
        Fetched::Substituted {
            tile: Tile::zeros(self.tile_res, self.tile_res),
            persist,
        }
    }
}

impl<F: Fetcher> TileSource for WorldCoverSource<F> {
    type Key = CellId;
    type Sample = u8;

    fn name(&self) -> &'static str {
        "worldcover"
    }

    fn tile_shape(&self) -> (usize, usize) {
        (self.tile_res, self.tile_res)
    }

    fn file_name(&self, key: &CellId) -> PathBuf {
        PathBuf::from(format!("{key}_r{}_u8.tile", self.tile_res))
    }

    fn fetch(&self, key: &CellId) -> Result<Fetched<u8>, TileError> {
        let bytes = match self.fetcher.fetch(&self.url(key)) {
            Ok(b) => b,
            Err(e @ FetchError::NotFound { .. }) => {
                warn!("Land cover tile {key} missing, treated as no data: {e}");
                return Ok(self.substitute(true));
            }
            Err(e) => {
                warn!("Land cover tile {key} unavailable, treated as no data: {e}");
                return Ok(self.substitute(false));
            }
        };
        match resample_geotiff(&bytes, self.tile_res) {
            Ok(tile) => Ok(Fetched::Fresh(tile)),
            Err(e) => {
                warn!("Land cover tile {key} undecodable, treated as no data: {e}");
                Ok(self.substitute(false))
            }
        }
    }
}

impl<F: Fetcher> GeoSampler for TileCache<WorldCoverSource<F>> {
    type Output = u8;

    /// Nearest class code; 0 where no data.
    fn sample(&self, points: &[LatLon]) -> Result<Vec<u8>, TileError> {
        let located: Vec<_> = points.iter().map(|&p| self.source().locate(p)).collect();
        let mut out = vec![0; points.len()];
        for (key, idx) in group_by_tile(located.iter().map(|l| l.0)) {
            let tile = self.get(&key)?;
            for i in idx {
                let (_, row, col) = located[i];
                out[i] = tile.nearest(row, col);
            }
        }
        Ok(out)
    }
}
