//! Batched point sampling.

use std::hash::Hash;

use geonet_coords::LatLon;
use rustc_hash::FxHashMap;

use crate::error::TileError;

/// Answers many latitude/longitude queries in one call.
pub trait GeoSampler: Sync {
    /// Value produced per point.
    type Output: Copy + Send;

    /// One output per input point, in input order.
    fn sample(&self, points: &[LatLon]) -> Result<Vec<Self::Output>, TileError>;
}

/// Indices of `keys` grouped by key, so each tile is looked up once.
pub fn group_by_tile<K: Hash + Eq>(keys: impl IntoIterator<Item = K>) -> FxHashMap<K, Vec<usize>> {
    let mut groups: FxHashMap<K, Vec<usize>> = FxHashMap::default();
    for (i, k) in keys.into_iter().enumerate() {
        groups.entry(k).or_default().push(i);
    }
    groups
}
