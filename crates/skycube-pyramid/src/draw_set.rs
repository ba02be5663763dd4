//! Incremental maintenance of the set of tiles handed to the scene.

use std::collections::BTreeSet;

use skycube_cube::TileAddress;

use crate::{PyramidError, TileCache, TileScene};

/// Tiles currently added to the scene.
///
/// Updates are incremental: new tiles are added before stale ones are
/// removed, so a region never goes blank between the two calls.
#[derive(Debug, Default)]
pub struct DrawSet {
    drawn: BTreeSet<TileAddress>,
}

impl DrawSet {
    /// Whether `address` is being drawn.
    pub fn contains(&self, address: &TileAddress) -> bool {
        self.drawn.contains(address)
    }

    /// Number of drawn tiles.
    pub fn len(&self) -> usize {
        self.drawn.len()
    }

    /// Whether nothing is drawn.
    pub fn is_empty(&self) -> bool {
        self.drawn.is_empty()
    }

    /// Drawn addresses, coarsest level first.
    pub fn addresses(&self) -> &BTreeSet<TileAddress> {
        &self.drawn
    }

    /// Make `next` the drawn set. Returns `(added, removed)` counts.
    ///
    /// Addresses in `next` that are not cached are skipped.
    pub fn update<S: TileScene + ?Sized>(
        &mut self,
        next: BTreeSet<TileAddress>,
        cache: &TileCache,
        scene: &mut S,
    ) -> Result<(usize, usize), PyramidError> {
        let mut kept = BTreeSet::new();
        let mut added = 0;
        for address in next {
            if self.drawn.contains(&address) {
                kept.insert(address);
                continue;
            }
            match cache.get(&address)? {
                Some(tile) => {
                    scene.add(tile);
                    kept.insert(address);
                    added += 1;
                }
                None => log::warn!("Skipping uncached tile {address} in draw set"),
            }
        }

        let mut removed = 0;
        for address in self.drawn.difference(&kept) {
            if let Some(tile) = cache.get(address)? {
                scene.remove(tile);
                removed += 1;
            }
        }

        self.drawn = kept;
        Ok((added, removed))
    }

    /// Remove every drawn tile from the scene.
    pub fn clear<S: TileScene + ?Sized>(
        &mut self,
        cache: &TileCache,
        scene: &mut S,
    ) -> Result<usize, PyramidError> {
        self.update(BTreeSet::new(), cache, scene)
            .map(|(_, removed)| removed)
    }
}
