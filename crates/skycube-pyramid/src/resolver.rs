//! Progressive refinement: choose what to draw for each visible cell.

use std::collections::BTreeSet;

use skycube_cube::{LevelRange, TileAddress};

use crate::{
    PyramidError, TextureOutcome, TextureState, TextureStatus, TextureStore, Tile, TileCache,
    TileScene, VisibilityFilter,
};

/// Outcome of resolving one frame.
#[derive(Debug, Default, Clone)]
pub struct Resolution {
    /// Visible cells at the selected level.
    pub visible: Vec<TileAddress>,
    /// Tiles to draw: the cells themselves, ancestors, or finer descendants.
    pub draw: BTreeSet<TileAddress>,
    /// Visible cells drawn with something other than their own tile.
    pub substituted: usize,
    /// Visible cells with nothing drawable yet.
    pub pending: usize,
    /// Visible cells whose own texture failed.
    pub failed: usize,
}

/// Decides, per visible cell, which loaded tile covers it.
///
/// For each visible cell at the selected level:
/// 1. its own tile when ready;
/// 2. otherwise its visible children when all of them are ready;
/// 3. otherwise the nearest ready ancestor, plus any ready children drawn over it.
///
/// Every tile looked at has its texture requested, so coarse ancestors stream
/// in first and finer tiles replace them as they arrive.
#[derive(Clone, Debug)]
pub struct TileResolver {
    prefetch_children: bool,
}

impl TileResolver {
    /// With `prefetch_children`, the children of every visible cell are
    /// created and requested so zooming in finds them loaded.
    pub fn new(prefetch_children: bool) -> Self {
        Self { prefetch_children }
    }

    /// Resolve the visible cells of `level`.
    pub fn resolve<S, T>(
        &self,
        level: u8,
        filter: &VisibilityFilter,
        cache: &mut TileCache,
        scene: &mut S,
        store: &mut T,
        frame: u64,
    ) -> Result<Resolution, PyramidError>
    where
        S: TileScene + ?Sized,
        T: TextureStore + ?Sized,
    {
        let range = cache.range();
        let mut resolution = Resolution {
            visible: filter.visible_addresses(level),
            ..Resolution::default()
        };

        for &cell in &resolution.visible {
            let state = {
                let tile = cache.get_or_create(scene, cell.parent(range), cell, None)?;
                tile.touch(frame);
                request(tile, store);
                tile.state()
            };

            let visible_children: Vec<TileAddress> = cell
                .children(range)
                .map(|children| {
                    children
                        .into_iter()
                        .filter(|child| filter.is_address_visible(child))
                        .collect()
                })
                .unwrap_or_default();

            match state {
                TextureState::Ready(_) => {
                    resolution.draw.insert(cell);
                }
                state => {
                    if state == TextureState::Failed {
                        resolution.failed += 1;
                    }
                    let mut ready_children = Vec::new();
                    for child in &visible_children {
                        if cache.is_ready(child)? {
                            ready_children.push(*child);
                        }
                    }

                    let covered_by_children =
                        !visible_children.is_empty() && ready_children.len() == visible_children.len();
                    let ancestor = if covered_by_children {
                        None
                    } else {
                        nearest_ready_ancestor(cell, range, cache, scene, store, frame)?
                    };

                    if ancestor.is_none() && ready_children.is_empty() {
                        resolution.pending += 1;
                    } else {
                        resolution.substituted += 1;
                    }
                    resolution.draw.extend(ancestor);
                    resolution.draw.extend(ready_children);
                }
            }

            if self.prefetch_children {
                for child in visible_children {
                    let tile = cache.get_or_create(scene, Some(cell), child, None)?;
                    tile.touch(frame);
                    request(tile, store);
                }
            }
        }

        Ok(resolution)
    }
}

/// Walk up from `cell`, creating and requesting each ancestor, until one is ready.
fn nearest_ready_ancestor<S, T>(
    cell: TileAddress,
    range: LevelRange,
    cache: &mut TileCache,
    scene: &mut S,
    store: &mut T,
    frame: u64,
) -> Result<Option<TileAddress>, PyramidError>
where
    S: TileScene + ?Sized,
    T: TextureStore + ?Sized,
{
    for ancestor in cell.ancestors(range) {
        let tile = cache.get_or_create(scene, ancestor.parent(range), ancestor, None)?;
        tile.touch(frame);
        request(tile, store);
        if tile.is_ready() {
            return Ok(Some(ancestor));
        }
    }
    Ok(None)
}

/// Query the store for a tile that has not been requested yet.
pub(crate) fn request<T: TextureStore + ?Sized>(tile: &mut Tile, store: &mut T) {
    if tile.state() != TextureState::Unrequested {
        return;
    }
    match store.query(tile.address()) {
        TextureStatus::NotRequested => {}
        TextureStatus::Pending => {
            tile.mark_requested();
            log::trace!("Requested texture for tile {}", tile.name());
        }
        TextureStatus::Ready(handle) => {
            tile.apply(&TextureOutcome::Ready(handle));
        }
        TextureStatus::Failed => {
            log::warn!("Texture for tile {} failed, falling back to ancestors", tile.name());
            tile.apply(&TextureOutcome::Failed("reported by store".to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingScene, ScriptedTextureStore};
    use crate::{BackgroundCamera, PanoramaCamera, TextureEvent, TextureHandle};
    use skycube_cube::{CubeFace, PyramidGeometry};

    struct Fixture {
        cache: TileCache,
        scene: RecordingScene,
        store: ScriptedTextureStore,
        filter: VisibilityFilter,
        resolver: TileResolver,
    }

    /// A 60° square view of the front face: exactly its four level-1 cells are visible.
    fn fixture(store: ScriptedTextureStore, prefetch: bool) -> Fixture {
        let geometry = PyramidGeometry::from_depth_far(1000.0);
        let camera = PanoramaCamera::new(60.0, 1.0);
        Fixture {
            cache: TileCache::new(LevelRange::default(), geometry),
            scene: RecordingScene::default(),
            store,
            filter: VisibilityFilter::new(&camera.view_projection(), geometry),
            resolver: TileResolver::new(prefetch),
        }
    }

    impl Fixture {
        fn resolve(&mut self, level: u8, frame: u64) -> Resolution {
            self.resolver
                .resolve(
                    level,
                    &self.filter,
                    &mut self.cache,
                    &mut self.scene,
                    &mut self.store,
                    frame,
                )
                .unwrap()
        }
    }

    fn front(level: u8, x: u32, y: u32) -> TileAddress {
        TileAddress::new(level, CubeFace::Front, x, y)
    }

    #[test]
    fn test_nothing_loaded_draws_nothing_and_requests_all() {
        let mut f = fixture(ScriptedTextureStore::default(), false);
        let resolution = f.resolve(1, 1);

        assert_eq!(resolution.visible.len(), 4);
        assert!(resolution.draw.is_empty());
        assert_eq!(resolution.pending, 4);
        for cell in &resolution.visible {
            assert_eq!(
                f.cache.get(cell).unwrap().unwrap().state(),
                TextureState::Requested
            );
        }
        // the shared ancestor is requested once
        assert_eq!(f.store.queries.iter().filter(|a| **a == front(0, 0, 0)).count(), 1);
    }

    #[test]
    fn test_ready_ancestor_covers_all_cells() {
        let mut f = fixture(ScriptedTextureStore::with_ready([front(0, 0, 0)]), false);
        let resolution = f.resolve(1, 1);
        assert_eq!(resolution.draw, BTreeSet::from([front(0, 0, 0)]));
        assert_eq!(resolution.substituted, 4);
        assert_eq!(resolution.pending, 0);
    }

    #[test]
    fn test_ready_cell_draws_itself() {
        let mut f = fixture(
            ScriptedTextureStore::with_ready([front(0, 0, 0), front(1, 1, 0)]),
            false,
        );
        let resolution = f.resolve(1, 1);
        assert_eq!(resolution.draw, BTreeSet::from([front(0, 0, 0), front(1, 1, 0)]));
        assert_eq!(resolution.substituted, 3);
    }

    #[test]
    fn test_ready_children_replace_missing_cell() {
        let children = front(1, 0, 0).subdivide();
        let mut f = fixture(ScriptedTextureStore::with_ready(children), true);

        // first pass creates the children through prefetch
        let first = f.resolve(1, 1);
        assert!(first.draw.is_empty());
        assert!(children.iter().all(|c| f.cache.is_ready(c).unwrap()));

        let second = f.resolve(1, 2);
        assert_eq!(second.draw, BTreeSet::from(children));
        assert_eq!(second.pending, 3);
        assert_eq!(second.substituted, 1);
    }

    #[test]
    fn test_partial_children_drawn_over_ancestor() {
        let child = front(1, 0, 0).subdivide()[3];
        let mut f = fixture(ScriptedTextureStore::with_ready([front(0, 0, 0), child]), true);
        f.resolve(1, 1);
        let resolution = f.resolve(1, 2);
        assert!(resolution.draw.contains(&front(0, 0, 0)));
        assert!(resolution.draw.contains(&child));
        assert_eq!(resolution.draw.len(), 2);
    }

    #[test]
    fn test_failed_cell_falls_back_permanently() {
        let mut store = ScriptedTextureStore::with_ready([front(0, 0, 0)]);
        store.failed.insert(front(1, 0, 1));
        let mut f = fixture(store, false);

        for frame in 1..=3 {
            let resolution = f.resolve(1, frame);
            assert_eq!(resolution.failed, 1);
            assert_eq!(resolution.draw, BTreeSet::from([front(0, 0, 0)]));
        }
        let failed_queries = f.store.queries.iter().filter(|a| **a == front(1, 0, 1)).count();
        assert_eq!(failed_queries, 1, "failed tiles are never retried");
    }

    #[test]
    fn test_late_event_makes_cell_drawable_next_pass() {
        let mut f = fixture(ScriptedTextureStore::with_ready([front(0, 0, 0)]), false);
        f.resolve(1, 1);
        f.cache
            .apply_texture_event(&TextureEvent {
                address: front(1, 1, 1),
                outcome: TextureOutcome::Ready(TextureHandle(42)),
            })
            .unwrap();
        let resolution = f.resolve(1, 2);
        assert_eq!(resolution.draw, BTreeSet::from([front(0, 0, 0), front(1, 1, 1)]));
    }

    #[test]
    fn test_prefetch_requests_visible_children() {
        let mut f = fixture(ScriptedTextureStore::default(), true);
        f.resolve(1, 1);
        assert_eq!(f.cache.len_at(2).unwrap(), 16);
        for child in front(1, 0, 0).subdivide() {
            let tile = f.cache.get(&child).unwrap().unwrap();
            assert_eq!(tile.parent(), Some(front(1, 0, 0)));
            assert_eq!(tile.state(), TextureState::Requested);
        }
    }
}
