//! Memoized per-level tile storage.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use skycube_cube::{LevelRange, PyramidGeometry, TileAddress, TileKey};

use crate::{PyramidError, TextureEvent, Tile, TileScene};

/// Per-level mapping from [`TileKey`] to [`Tile`].
///
/// Tiles are created lazily through [`TileCache::get_or_create`], never
/// duplicated, and kept until eviction or [`TileCache::destroy`].
pub struct TileCache {
    /// One map per level of `range`, indexed by `level - range.min()`.
    levels: Vec<FxHashMap<TileKey, Tile>>,
    range: LevelRange,
    geometry: PyramidGeometry,
    next_serial: u64,
    destroyed: bool,
}

impl TileCache {
    /// Create an empty cache for the given pyramid.
    pub fn new(range: LevelRange, geometry: PyramidGeometry) -> Self {
        Self {
            levels: range.levels().map(|_| FxHashMap::default()).collect(),
            range,
            geometry,
            next_serial: 0,
            destroyed: false,
        }
    }

    /// Levels this cache accepts.
    pub fn range(&self) -> LevelRange {
        self.range
    }

    /// Whether [`TileCache::destroy`] has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn slot(&self, level: u8) -> Result<usize, PyramidError> {
        if self.destroyed {
            return Err(PyramidError::UseAfterDestroy);
        }
        if !self.range.contains(level) {
            return Err(PyramidError::LevelOutsidePyramid {
                level,
                min: self.range.min(),
                max: self.range.max(),
            });
        }
        Ok((level - self.range.min()) as usize)
    }

    /// Return the tile at `address`, creating and registering it with `scene` if absent.
    ///
    /// `name` defaults to [`TileAddress::display_name`]. An existing tile is
    /// returned unchanged: its parent link and name are not updated and the
    /// scene is not notified again.
    pub fn get_or_create<S: TileScene + ?Sized>(
        &mut self,
        scene: &mut S,
        parent: Option<TileAddress>,
        address: TileAddress,
        name: Option<&str>,
    ) -> Result<&mut Tile, PyramidError> {
        let slot = self.slot(address.level())?;
        let size = self.geometry.tile_size(address.level());
        let next_serial = &mut self.next_serial;
        let tile = self.levels[slot].entry(address.key()).or_insert_with(|| {
            let name = name.map_or_else(|| address.display_name(), str::to_owned);
            let tile = Tile::new(*next_serial, address, parent, name, size);
            *next_serial += 1;
            log::trace!("Created tile {}", tile.name());
            scene.register(&tile);
            tile
        });
        Ok(tile)
    }

    /// Look up a tile without creating it.
    pub fn get(&self, address: &TileAddress) -> Result<Option<&Tile>, PyramidError> {
        let slot = self.slot(address.level())?;
        Ok(self.levels[slot].get(&address.key()))
    }

    /// Mutable lookup without creation.
    pub fn get_mut(&mut self, address: &TileAddress) -> Result<Option<&mut Tile>, PyramidError> {
        let slot = self.slot(address.level())?;
        Ok(self.levels[slot].get_mut(&address.key()))
    }

    /// Whether the tile at `address` is cached and drawable.
    pub fn is_ready(&self, address: &TileAddress) -> Result<bool, PyramidError> {
        Ok(self.get(address)?.is_some_and(Tile::is_ready))
    }

    /// Number of cached tiles at `level`.
    pub fn len_at(&self, level: u8) -> Result<usize, PyramidError> {
        let slot = self.slot(level)?;
        Ok(self.levels[slot].len())
    }

    /// Number of cached tiles across all levels.
    pub fn len(&self) -> usize {
        self.levels.iter().map(FxHashMap::len).sum()
    }

    /// Whether no tile is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate every cached tile, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.levels.iter().flat_map(FxHashMap::values)
    }

    /// Apply a texture verdict to the tile it targets.
    ///
    /// Returns the updated tile, or `None` when the tile is not cached or its
    /// state was already terminal. Never touches the draw set.
    pub fn apply_texture_event(
        &mut self,
        event: &TextureEvent,
    ) -> Result<Option<&Tile>, PyramidError> {
        if self.destroyed {
            return Err(PyramidError::UseAfterDestroy);
        }
        if !self.range.contains(event.address.level()) {
            return Ok(None);
        }
        let Some(tile) = self.get_mut(&event.address)? else {
            log::trace!("Texture event for uncached tile {}", event.address);
            return Ok(None);
        };
        if !tile.apply(&event.outcome) {
            return Ok(None);
        }
        Ok(Some(&*tile))
    }

    /// Drop the least recently seen tiles of `level` until at most `cap` remain.
    ///
    /// Tiles in `pinned` or seen during `frame` are never evicted, so the
    /// level may stay above `cap`. Evicted tiles are released from `scene`.
    pub fn evict<S: TileScene + ?Sized>(
        &mut self,
        scene: &mut S,
        level: u8,
        cap: usize,
        frame: u64,
        pinned: &BTreeSet<TileAddress>,
    ) -> Result<usize, PyramidError> {
        let slot = self.slot(level)?;
        let tiles = &mut self.levels[slot];
        if tiles.len() <= cap {
            return Ok(0);
        }

        let mut candidates: Vec<(u64, u64, TileKey)> = tiles
            .values()
            .filter(|t| t.last_seen() < frame && !pinned.contains(&t.address()))
            .map(|t| (t.last_seen(), t.serial(), t.key()))
            .collect();
        candidates.sort_unstable();

        let excess = tiles.len() - cap;
        let mut evicted = 0;
        for (_, _, key) in candidates.into_iter().take(excess) {
            if tiles.remove(&key).is_some() {
                scene.release(key.address());
                evicted += 1;
            }
        }
        if evicted > 0 {
            log::debug!("Evicted {evicted} tiles from level {level}");
        }
        Ok(evicted)
    }

    /// Drop every tile and refuse further use.
    ///
    /// Returns the addresses that were cached. Textures stay with the store.
    pub fn destroy(&mut self) -> Vec<TileAddress> {
        let released = self
            .levels
            .iter_mut()
            .flat_map(|tiles| tiles.drain().map(|(key, _)| key.address()))
            .collect();
        self.levels.clear();
        self.destroyed = true;
        released
    }
}
