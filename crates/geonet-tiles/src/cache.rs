//! Three-tier tile cache: memory, disk, network.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use lru::LruCache;
use tracing::debug;

use crate::error::TileError;
use crate::source::{Fetched, TileSource};
use crate::store::TileStore;
use crate::tile::Tile;

/// Counters for one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from memory.
    pub memory_hits: u64,
    /// Lookups answered from disk.
    pub disk_hits: u64,
    /// Tiles fetched and decoded from the network.
    pub network_fetches: u64,
    /// Tiles replaced by a placeholder.
    pub substituted: u64,
    /// Tiles dropped from memory to stay within capacity.
    pub evictions: u64,
    /// Tiles currently resident in memory.
    pub resident: usize,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} memory hits, {} disk hits, {} fetched, {} substituted, {} evicted, {} resident",
            self.memory_hits, self.disk_hits, self.network_fetches, self.substituted, self.evictions, self.resident
        )
    }
}

#[derive(Default)]
struct Counters {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    network_fetches: AtomicU64,
    substituted: AtomicU64,
    evictions: AtomicU64,
}

/// Memory → disk → network tile lookup for one [`TileSource`].
///
/// Safe to share across threads. At most one thread loads a given missing
/// key at a time; others asking for the same key wait and then read the
/// result from memory.
pub struct TileCache<S: TileSource> {
    source: S,
    store: TileStore,
    memory: Mutex<LruCache<S::Key, Arc<Tile<S::Sample>>>>,
    in_flight: DashMap<S::Key, Arc<Mutex<()>>>,
    counters: Counters,
}

impl<S: TileSource> TileCache<S> {
    /// Cache holding at most `max_mem_tiles` decoded tiles in memory
    /// (minimum one).
    pub fn new(source: S, store: TileStore, max_mem_tiles: usize) -> Self {
        let cap = NonZeroUsize::new(max_mem_tiles).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            store,
            memory: Mutex::new(LruCache::new(cap)),
            in_flight: DashMap::new(),
            counters: Counters::default(),
        }
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Look up a tile, falling through memory, disk and network.
    pub fn get(&self, key: &S::Key) -> Result<Arc<Tile<S::Sample>>, TileError> {
        if let Some(tile) = self.from_memory(key) {
            return Ok(tile);
        }

        loop {
            let gate = self
                .in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);

            // The previous holder may have retired this gate; queue on the
            // current one instead of loading next to its owner.
            let current = self
                .in_flight
                .get(key)
                .is_some_and(|g| Arc::ptr_eq(g.value(), &gate));
            if !current {
                continue;
            }

            let result = match self.from_memory(key) {
                Some(tile) => Ok(tile),
                None => self.load_slow(key),
            };
            self.in_flight.remove_if(key, |_, g| Arc::ptr_eq(g, &gate));
            return result;
        }
    }

    fn from_memory(&self, key: &S::Key) -> Option<Arc<Tile<S::Sample>>> {
        let mut memory = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
        let tile = memory.get(key).cloned()?;
        self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
        Some(tile)
    }

    fn load_slow(&self, key: &S::Key) -> Result<Arc<Tile<S::Sample>>, TileError> {
        let name = self.source.file_name(key);
        let shape = self.source.tile_shape();

        if let Some(tile) = self.store.load(&name, shape)? {
            debug!(source = self.source.name(), %key, "Tile disk hit");
            self.counters.disk_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(self.remember(key, tile));
        }

        let tile = match self.source.fetch(key)? {
            Fetched::Fresh(tile) => {
                debug!(source = self.source.name(), %key, "Tile fetched");
                self.counters.network_fetches.fetch_add(1, Ordering::Relaxed);
                self.store.save(&name, &tile)?;
                tile
            }
            Fetched::Substituted { tile, persist } => {
                self.counters.substituted.fetch_add(1, Ordering::Relaxed);
                if persist {
                    self.store.save(&name, &tile)?;
                }
                tile
            }
        };
        Ok(self.remember(key, tile))
    }

    fn remember(&self, key: &S::Key, tile: Tile<S::Sample>) -> Arc<Tile<S::Sample>> {
        let tile = Arc::new(tile);
        let mut memory = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((old, _)) = memory.push(key.clone(), Arc::clone(&tile)) {
            if old != *key {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        tile
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        let resident = self.memory.lock().unwrap_or_else(PoisonError::into_inner).len();
        CacheStats {
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.counters.disk_hits.load(Ordering::Relaxed),
            network_fetches: self.counters.network_fetches.load(Ordering::Relaxed),
            substituted: self.counters.substituted.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            resident,
        }
    }
}
