//! On-demand geographic tile caches.
//!
//! A [`TileCache`] answers tile lookups from three tiers in order: a bounded
//! in-memory LRU, a directory of `.tile` files, and a [`TileSource`] that
//! fetches and decodes from the network. Two sources are provided:
//! [`TerrariumSource`] for elevation and [`WorldCoverSource`] for land-cover
//! classes. Both caches implement [`GeoSampler`] for batched lookups by
//! latitude/longitude.

mod cache;
mod error;
mod fetch;
mod sampler;
mod source;
mod store;
mod terrarium;
mod tile;
mod worldcover;

pub use cache::{CacheStats, TileCache};
pub use error::{FetchError, StoreError, TileError};
pub use fetch::{Attempt, Fetcher, HttpFetcher, RetryPolicy};
pub use sampler::{GeoSampler, group_by_tile};
pub use source::{Fetched, TileSource};
pub use store::{TileStore, decode_tile, encode_tile};
pub use terrarium::{MAX_MERCATOR_LAT, TerrariumKey, TerrariumSource, decode_terrarium, mercator_locate};
pub use tile::{Tile, TileSample};
pub use worldcover::{CELL_DEG, CellId, GeoTiffError, WorldCoverSource, resample_geotiff};
