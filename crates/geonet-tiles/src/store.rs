//! Persistent tile files.
//!
//! ## Binary Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Magic bytes `GNTL` |
//! | 4 | 1 | Format version (`u8`, currently 1) |
//! | 5 | 1 | Sample type tag ([`TileSample::DTYPE`]) |
//! | 6 | 4 | Rows (`u32`, little-endian) |
//! | 10 | 4 | Columns (`u32`, little-endian) |
//! | 14 | rows×cols×size | Samples, row-major, little-endian |

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{StoreError, TileError};
use crate::tile::{Tile, TileSample};

const MAGIC: [u8; 4] = *b"GNTL";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 14;

/// Serialize a tile into the `.tile` format.
#[must_use]
pub fn encode_tile<T: TileSample>(tile: &Tile<T>) -> Vec<u8> {
    let (rows, cols) = tile.shape();
    let mut buf = Vec::with_capacity(HEADER_LEN + tile.byte_size());
    buf.extend_from_slice(&MAGIC);
    buf.push(FORMAT_VERSION);
    buf.push(T::DTYPE);
    buf.extend_from_slice(&(rows as u32).to_le_bytes());
    buf.extend_from_slice(&(cols as u32).to_le_bytes());
    for &s in tile.samples() {
        s.write_le(&mut buf);
    }
    buf
}

/// Parse a `.tile` buffer, requiring the given shape and sample type.
pub fn decode_tile<T: TileSample>(data: &[u8], expected: (usize, usize)) -> Result<Tile<T>, StoreError> {
    if data.len() < 4 || data[0..4] != MAGIC {
        return Err(StoreError::InvalidMagic);
    }
    if data.len() < HEADER_LEN {
        return Err(StoreError::Length {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    }
    if data[4] != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion(data[4]));
    }
    if data[5] != T::DTYPE {
        return Err(StoreError::DtypeMismatch {
            found: data[5],
            expected: T::DTYPE,
        });
    }

    let rows = u32::from_le_bytes([data[6], data[7], data[8], data[9]]) as usize;
    let cols = u32::from_le_bytes([data[10], data[11], data[12], data[13]]) as usize;
    if (rows, cols) != expected {
        return Err(StoreError::ShapeMismatch {
            found: (rows, cols),
            expected,
        });
    }

    let payload = &data[HEADER_LEN..];
    let want = rows * cols * T::SIZE;
    if payload.len() != want {
        return Err(StoreError::Length {
            expected: want,
            actual: payload.len(),
        });
    }

    let samples = payload.chunks_exact(T::SIZE).map(T::read_le).collect();
    Tile::from_vec(rows, cols, samples).ok_or(StoreError::Length {
        expected: want,
        actual: payload.len(),
    })
}

/// A directory of `.tile` files.
#[derive(Clone, Debug)]
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    /// Store rooted at `root`. Nothing is created until the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a relative tile name.
    #[must_use]
    pub fn path(&self, name: &Path) -> PathBuf {
        self.root.join(name)
    }

    /// Load and validate a tile.
    ///
    /// Returns `Ok(None)` when the file is absent. A file that fails
    /// validation is deleted and also reported as `Ok(None)` so the caller
    /// refetches it.
    pub fn load<T: TileSample>(&self, name: &Path, shape: (usize, usize)) -> Result<Option<Tile<T>>, TileError> {
        let path = self.path(name);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match decode_tile(&bytes, shape) {
            Ok(tile) => Ok(Some(tile)),
            Err(reason) => {
                warn!("Discarding corrupt tile {}: {reason}", path.display());
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                Ok(None)
            }
        }
    }

    /// Write a tile, creating parent directories as needed.
    ///
    /// The file is written under a temporary name and renamed into place so
    /// concurrent readers never observe a partial file.
    pub fn save<T: TileSample>(&self, name: &Path, tile: &Tile<T>) -> Result<(), TileError> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tile.part");
        fs::write(&tmp, encode_tile(tile))?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
