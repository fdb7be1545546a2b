//! The network tier of a [`crate::TileCache`].

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::path::PathBuf;

use crate::error::TileError;
use crate::tile::{Tile, TileSample};

/// Result of asking a source for a tile.
#[derive(Debug)]
pub enum Fetched<T> {
    /// Real data, decoded from the network.
    Fresh(Tile<T>),
    /// The source had no usable data and `tile` stands in for it.
    ///
    /// `persist` is true when the absence is permanent (the server said the
    /// tile does not exist) and the substitute may be written to disk.
    Substituted {
        /// Placeholder samples.
        tile: Tile<T>,
        /// Whether to write the placeholder through to the store.
        persist: bool,
    },
}

/// Fetches and decodes tiles for one dataset.
pub trait TileSource: Send + Sync {
    /// Tile address.
    type Key: Clone + Eq + Hash + Debug + Display + Send + Sync;
    /// Sample type of decoded tiles.
    type Sample: TileSample;

    /// Short dataset name for logs.
    fn name(&self) -> &'static str;

    /// `(rows, cols)` every tile of this source must have.
    fn tile_shape(&self) -> (usize, usize);

    /// Store-relative file name for `key`.
    fn file_name(&self, key: &Self::Key) -> PathBuf;

    /// Fetch and decode `key` from the network.
    fn fetch(&self, key: &Self::Key) -> Result<Fetched<Self::Sample>, TileError>;
}
